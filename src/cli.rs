//! CLI argument parsing with clap.

use clap::{Args, Parser, Subcommand};

/// Quote card sticker bot.
#[derive(Parser, Debug)]
#[command(name = "quotecard", version, about)]
pub struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,

    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bot, long-polling Telegram for quote commands.
    Run,
    /// Render a single quote card to a file.
    Render(RenderArgs),
}

/// Arguments for `quotecard render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Quoted text.
    #[arg(conflicts_with = "text_file")]
    pub text: Option<String>,

    /// Path to a file containing the quoted text.
    #[arg(short = 'p', long, conflicts_with = "text")]
    pub text_file: Option<String>,

    /// Sender name drawn above the text.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Avatar image file.
    #[arg(long, conflicts_with = "avatar_url")]
    pub avatar: Option<String>,

    /// Avatar image URL.
    #[arg(long)]
    pub avatar_url: Option<String>,

    /// Output format: webp (sticker) or png (raw card).
    #[arg(short, long, default_value = "webp")]
    pub format: String,

    /// Output file path (auto-generated if not specified).
    #[arg(short, long)]
    pub output: Option<String>,
}

impl RenderArgs {
    /// Resolve the text from either the positional argument or the file flag.
    ///
    /// # Errors
    ///
    /// Returns an error if neither text nor text-file is provided,
    /// or if the file cannot be read.
    pub fn resolve_text(&self) -> Result<String, std::io::Error> {
        if let Some(ref text) = self.text {
            Ok(text.clone())
        } else if let Some(ref path) = self.text_file {
            std::fs::read_to_string(path)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Provide quote text or use -p/--text-file",
            ))
        }
    }
}
