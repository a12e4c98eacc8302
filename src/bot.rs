//! Long-polling loop that feeds Telegram updates to the quote handler.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::adapters::live::telegram::TelegramClient;
use crate::error::QuoteError;
use crate::handler::QuoteHandler;
use crate::model::InboundMessage;

/// Pause after a failed poll before trying again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Poll for updates until Ctrl-C, handling each message on its own task.
///
/// Requests already running when Ctrl-C arrives are finished before returning.
///
/// # Errors
///
/// Currently never fails once polling has started; poll errors are logged and
/// retried.
pub async fn run(
    telegram: Arc<TelegramClient>,
    handler: Arc<QuoteHandler>,
) -> Result<(), QuoteError> {
    let mut offset: i64 = 0;
    let mut in_flight = InFlight::default();
    info!("Listening for quote commands");

    loop {
        let polled = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            polled = telegram.get_updates(offset) => polled,
        };

        let updates = match polled {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "Telegram poll failed");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            in_flight.spawn(Arc::clone(&handler), message.to_inbound());
        }
    }

    in_flight.drain().await;
    Ok(())
}

/// Quote requests that are still running.
#[derive(Default)]
struct InFlight {
    tasks: JoinSet<()>,
}

impl InFlight {
    /// Handle `inbound` on a new task and reap tasks that already finished.
    fn spawn(&mut self, handler: Arc<QuoteHandler>, inbound: InboundMessage) {
        while let Some(joined) = self.tasks.try_join_next() {
            log_join(joined);
        }

        self.tasks.spawn(async move {
            match handler.handle(&inbound).await {
                Ok(outcome) => debug!(?outcome, "Message handled"),
                Err(e) => error!(
                    error = %e,
                    chat_id = inbound.reference.chat_id,
                    message_id = inbound.reference.message_id,
                    "Quote request failed"
                ),
            }
        });
    }

    /// Wait for every request still running.
    async fn drain(mut self) {
        if !self.tasks.is_empty() {
            info!(
                pending = self.tasks.len(),
                "Waiting for in-flight quote requests"
            );
        }
        while let Some(joined) = self.tasks.join_next().await {
            log_join(joined);
        }
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Quote task panicked");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::card::CardRenderer;
    use crate::handler::CommandDetector;
    use crate::model::{MessageRef, QuotedMessage, Sender};
    use crate::ports::avatar::FetchFuture;
    use crate::ports::transport::TransportFuture;
    use crate::ports::{AvatarFetcher, ChatTransport};

    /// Transport whose sticker upload takes a while to complete.
    #[derive(Default)]
    struct SlowTransport {
        stickers: Mutex<Vec<MessageRef>>,
    }

    impl ChatTransport for SlowTransport {
        fn reply_text(&self, _to: MessageRef, _text: String) -> TransportFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }

        fn send_sticker(&self, to: MessageRef, _sticker: Vec<u8>) -> TransportFuture<'_, ()> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                self.stickers.lock().unwrap().push(to);
                Ok(())
            })
        }

        fn avatar_url(&self, _sender: Sender) -> TransportFuture<'_, Option<String>> {
            Box::pin(async { Ok(None) })
        }
    }

    struct NoAvatars;

    impl AvatarFetcher for NoAvatars {
        fn fetch(&self, _url: String) -> FetchFuture<'_> {
            Box::pin(async { Err(QuoteError::Avatar("no avatars here".into())) })
        }
    }

    fn quote_request(message_id: i64) -> InboundMessage {
        InboundMessage {
            reference: MessageRef {
                chat_id: 7,
                message_id,
            },
            body: "/quote".into(),
            quoted: Some(QuotedMessage {
                text: "finish what you started".into(),
                sender: Sender {
                    user_id: Some(3),
                    display_name: Some("Carol".into()),
                },
            }),
        }
    }

    #[tokio::test]
    async fn drain_waits_for_running_requests() {
        let transport = Arc::new(SlowTransport::default());
        let handler = Arc::new(QuoteHandler::new(
            CommandDetector::new("/quote"),
            "Please reply to a message with /quote".into(),
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
            Arc::new(NoAvatars),
            Arc::new(CardRenderer::new(None, &[])),
        ));

        let mut in_flight = InFlight::default();
        in_flight.spawn(Arc::clone(&handler), quote_request(1));
        in_flight.spawn(Arc::clone(&handler), quote_request(2));
        assert!(transport.stickers.lock().unwrap().is_empty());

        in_flight.drain().await;

        let mut sent: Vec<i64> = transport
            .stickers
            .lock()
            .unwrap()
            .iter()
            .map(|to| to.message_id)
            .collect();
        sent.sort_unstable();
        assert_eq!(sent, vec![1, 2]);
    }

    #[tokio::test]
    async fn drain_with_nothing_running_returns() {
        InFlight::default().drain().await;
    }
}
