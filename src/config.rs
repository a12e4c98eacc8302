//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable that overrides `[telegram] token`.
pub const TOKEN_ENV_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Bot API connection settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Command handling settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Card rendering settings.
    #[serde(default)]
    pub card: CardConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Bot API connection settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`.
    pub token: Option<String>,
    /// Base URL of the Bot API (point this at a local Bot API server if needed).
    pub api_url: String,
    /// Long-poll timeout for `getUpdates`, in seconds.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
        }
    }
}

/// Command handling settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Leading token that activates the command.
    pub trigger: String,
    /// Reply sent when the trigger is used without a quoted message.
    /// Defaults to a hint naming the trigger.
    pub rejection: Option<String>,
    /// Upper bound on the avatar download, in seconds.
    pub avatar_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger: "/quote".to_string(),
            rejection: None,
            avatar_timeout_secs: 10,
        }
    }
}

impl BotConfig {
    /// The rejection text, falling back to a hint built from the trigger.
    #[must_use]
    pub fn rejection_text(&self) -> String {
        self.rejection
            .clone()
            .unwrap_or_else(|| format!("Please reply to a message with {}", self.trigger))
    }
}

/// Card rendering settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    /// Preferred font family; the system sans-serif face is used when unset.
    pub font_family: Option<String>,
    /// Extra font files to load in addition to the system fonts.
    pub font_files: Vec<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Append log lines to this file as well as stderr.
    pub file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Get the bot token, preferring the environment variable.
    #[must_use]
    pub fn bot_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.telegram.token.clone())
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `QUOTECARD_CONFIG` environment variable
/// 3. `~/.config/quotecard/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("QUOTECARD_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/quotecard/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/quotecard/config.toml")
    } else {
        PathBuf::from("quotecard.toml")
    }
}
