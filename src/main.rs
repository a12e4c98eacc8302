//! Quotecard - turns quoted chat messages into quote card stickers.

mod adapters;
mod bot;
mod card;
mod cli;
mod config;
mod context;
mod error;
mod handler;
mod logging;
mod model;
mod output;
mod ports;
mod sticker;

use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Cli, Command, RenderArgs};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::QuoteError;
use crate::handler::{CommandDetector, QuoteHandler};
use crate::model::{AvatarSource, QuoteCardRequest, Sender};
use crate::output::{resolve_output_path, save_card, validate_format};
use crate::ports::ChatTransport;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), QuoteError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(QuoteError::Config)?;

    logging::init_tracing(cli.verbose, config.log.file.as_deref()).map_err(QuoteError::Config)?;

    match cli.command {
        Command::Run => run_bot(&config).await,
        Command::Render(args) => render(&config, args).await,
    }
}

async fn run_bot(config: &Config) -> Result<(), QuoteError> {
    let telegram = ServiceContext::telegram(config)?;
    let me = telegram.get_me().await?;

    let mut detector = CommandDetector::new(config.bot.trigger.clone());
    if let Some(username) = me.username {
        info!(%username, trigger = %config.bot.trigger, "Connected to Telegram");
        detector = detector.with_bot_username(username);
    }

    let ctx = ServiceContext::new(config);
    let handler = Arc::new(QuoteHandler::new(
        detector,
        config.bot.rejection_text(),
        Arc::clone(&telegram) as Arc<dyn ChatTransport>,
        ctx.avatars,
        ctx.renderer,
    ));

    bot::run(telegram, handler).await
}

async fn render(config: &Config, args: RenderArgs) -> Result<(), QuoteError> {
    // Validate before loading fonts
    validate_format(&args.format).map_err(QuoteError::InvalidArgument)?;
    let text = args.resolve_text()?;

    let avatar = match (&args.avatar, &args.avatar_url) {
        (Some(path), _) => match std::fs::read(path) {
            Ok(bytes) => Some(AvatarSource::Bytes(bytes)),
            Err(e) => {
                warn!(%path, error = %e, "Failed to read avatar, drawing card without it");
                None
            }
        },
        (None, Some(url)) => Some(AvatarSource::Url(url.clone())),
        (None, None) => None,
    };
    let sender = Sender {
        user_id: None,
        display_name: args.name.clone(),
    };
    let request = QuoteCardRequest {
        sender_name: sender.name_or_fallback(),
        text,
        avatar,
    };
    let output_path =
        resolve_output_path(args.output.as_deref(), &request.sender_name, &args.format);

    let ctx = ServiceContext::new(config);
    let png = card::compose(ctx.renderer, request, ctx.avatars.as_ref()).await?;

    save_card(&png, &args.format, &output_path)?;
    eprintln!("Saved: {}", output_path.display());
    Ok(())
}
