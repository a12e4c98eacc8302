//! Quote command handling: detect, compose, package, reply.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::card::{self, CardRenderer};
use crate::error::QuoteError;
use crate::model::{AvatarSource, InboundMessage, QuoteCardRequest, QuotedMessage};
use crate::ports::{AvatarFetcher, ChatTransport};
use crate::sticker::encode_sticker;

/// What an inbound message asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Detection<'a> {
    /// Not a quote command.
    Ignored,
    /// Quote command without a quoted message.
    MissingQuote,
    /// Quote command replying to this message.
    Quote(&'a QuotedMessage),
}

/// Recognizes the trigger token at the start of a message.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    trigger: String,
    bot_username: Option<String>,
}

impl CommandDetector {
    /// Detector for `trigger`, accepting `trigger@<any bot>` until a username is set.
    #[must_use]
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            bot_username: None,
        }
    }

    /// Only accept addressed commands (`/quote@name`) aimed at this bot.
    #[must_use]
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    fn matches(&self, token: &str) -> bool {
        let Some(rest) = token.strip_prefix(self.trigger.as_str()) else {
            return false;
        };
        if rest.is_empty() {
            return true;
        }
        match (rest.strip_prefix('@'), &self.bot_username) {
            (Some(target), Some(me)) => target.eq_ignore_ascii_case(me),
            (Some(target), None) => !target.is_empty(),
            (None, _) => false,
        }
    }

    /// Classify `message`.
    #[must_use]
    pub fn detect<'a>(&self, message: &'a InboundMessage) -> Detection<'a> {
        let Some(first) = message.body.split_whitespace().next() else {
            return Detection::Ignored;
        };
        if !self.matches(first) {
            return Detection::Ignored;
        }
        match &message.quoted {
            Some(quoted) => Detection::Quote(quoted),
            None => Detection::MissingQuote,
        }
    }
}

/// Result of handling one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a quote command; nothing was sent.
    Ignored,
    /// Quote command without a quoted message; a rejection was sent.
    Rejected,
    /// A sticker was sent.
    StickerSent,
}

/// Runs the detect → compose → package → reply pipeline for one message.
pub struct QuoteHandler {
    detector: CommandDetector,
    rejection: String,
    transport: Arc<dyn ChatTransport>,
    avatars: Arc<dyn AvatarFetcher>,
    renderer: Arc<CardRenderer>,
}

impl QuoteHandler {
    /// Wire a handler to its collaborators.
    #[must_use]
    pub fn new(
        detector: CommandDetector,
        rejection: String,
        transport: Arc<dyn ChatTransport>,
        avatars: Arc<dyn AvatarFetcher>,
        renderer: Arc<CardRenderer>,
    ) -> Self {
        Self {
            detector,
            rejection,
            transport,
            avatars,
            renderer,
        }
    }

    /// Handle one inbound message.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering, packaging or sending fails. Avatar
    /// problems are logged and do not fail the request.
    #[instrument(
        skip_all,
        fields(chat_id = message.reference.chat_id, message_id = message.reference.message_id)
    )]
    pub async fn handle(&self, message: &InboundMessage) -> Result<Outcome, QuoteError> {
        let quoted = match self.detector.detect(message) {
            Detection::Ignored => return Ok(Outcome::Ignored),
            Detection::MissingQuote => {
                info!("Quote command without a quoted message");
                self.transport
                    .reply_text(message.reference, self.rejection.clone())
                    .await?;
                return Ok(Outcome::Rejected);
            }
            Detection::Quote(quoted) => quoted,
        };

        let request = self.request_for(quoted).await;
        debug!(
            sender = %request.sender_name,
            chars = request.text.chars().count(),
            "Composing card"
        );

        let png = card::compose(Arc::clone(&self.renderer), request, self.avatars.as_ref()).await?;
        let sticker = tokio::task::spawn_blocking(move || encode_sticker(&png))
            .await
            .map_err(|e| QuoteError::Transcode(format!("Encode task failed: {e}")))??;

        self.transport
            .send_sticker(message.reference, sticker)
            .await?;
        info!("Quote sticker sent");
        Ok(Outcome::StickerSent)
    }

    async fn request_for(&self, quoted: &QuotedMessage) -> QuoteCardRequest {
        let avatar = match self.transport.avatar_url(quoted.sender.clone()).await {
            Ok(url) => url.map(AvatarSource::Url),
            Err(e) => {
                warn!(error = %e, "Failed to look up avatar, drawing card without it");
                None
            }
        };
        QuoteCardRequest {
            sender_name: quoted.sender.name_or_fallback(),
            text: quoted.text.clone(),
            avatar,
        }
    }
}
