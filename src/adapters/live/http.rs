//! Live avatar fetcher over HTTP.

use std::time::Duration;

use reqwest::Client;

use crate::error::QuoteError;
use crate::ports::avatar::{AvatarFetcher, FetchFuture};

/// Downloads avatars with a per-request timeout.
pub struct HttpAvatarFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpAvatarFetcher {
    /// Create a fetcher whose downloads give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

impl AvatarFetcher for HttpAvatarFetcher {
    fn fetch(&self, url: String) -> FetchFuture<'_> {
        Box::pin(async move {
            // Avatar URLs can embed the bot token; keep them out of error text.
            let response = self
                .client
                .get(&url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(reqwest::Error::without_url)?;

            let status = response.status();
            if !status.is_success() {
                return Err(QuoteError::Api {
                    status: status.as_u16(),
                    message: "avatar download failed".to_string(),
                });
            }

            let bytes = response.bytes().await.map_err(reqwest::Error::without_url)?;
            Ok(bytes.to_vec())
        })
    }
}
