//! Service context that bundles the shared collaborators.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::live::http::HttpAvatarFetcher;
use crate::adapters::live::telegram::TelegramClient;
use crate::card::CardRenderer;
use crate::config::{Config, TOKEN_ENV_VAR};
use crate::error::QuoteError;
use crate::ports::AvatarFetcher;

/// Collaborators shared by every request.
pub struct ServiceContext {
    /// Avatar fetcher port.
    pub avatars: Arc<dyn AvatarFetcher>,
    /// Card renderer holding the font database.
    pub renderer: Arc<CardRenderer>,
}

impl ServiceContext {
    /// Build the avatar fetcher and load fonts.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let avatars = HttpAvatarFetcher::new(Duration::from_secs(config.bot.avatar_timeout_secs));
        let renderer = CardRenderer::new(config.card.font_family.clone(), &config.card.font_files);
        Self {
            avatars: Arc::new(avatars),
            renderer: Arc::new(renderer),
        }
    }

    /// Create the Bot API client.
    ///
    /// # Errors
    ///
    /// Returns an error if no bot token is configured.
    pub fn telegram(config: &Config) -> Result<Arc<TelegramClient>, QuoteError> {
        let token = config
            .bot_token()
            .ok_or_else(|| QuoteError::MissingToken {
                env_var: TOKEN_ENV_VAR.into(),
            })?;
        Ok(Arc::new(TelegramClient::new(
            &config.telegram.api_url,
            token,
            config.telegram.poll_timeout_secs,
        )))
    }
}
