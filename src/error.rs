//! Unified error type for quotecard.

use thiserror::Error;

/// Errors that can occur while handling a quote command.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The Bot API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description from the API.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Drawing the card failed.
    #[error("Render error: {0}")]
    Render(String),

    /// Packaging the card as a sticker failed.
    #[error("Transcode error: {0}")]
    Transcode(String),

    /// The avatar could not be fetched or decoded.
    #[error("Avatar error: {0}")]
    Avatar(String),

    /// No bot token configured.
    #[error("No bot token. Set {env_var} or add it to the [telegram] section of the config file.")]
    MissingToken {
        /// The environment variable name.
        env_var: String,
    },
}
