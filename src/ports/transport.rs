//! Chat transport port for replying into the originating conversation.

use std::future::Future;
use std::pin::Pin;

use crate::error::QuoteError;
use crate::model::{MessageRef, Sender};

/// Boxed future type returned by [`ChatTransport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, QuoteError>> + Send + 'a>>;

/// Sends replies and resolves sender metadata on a chat platform.
pub trait ChatTransport: Send + Sync {
    /// Reply to `to` with a plain text message.
    fn reply_text(&self, to: MessageRef, text: String) -> TransportFuture<'_, ()>;

    /// Reply to `to` with encoded sticker bytes, rendered as a sticker by clients.
    fn send_sticker(&self, to: MessageRef, sticker: Vec<u8>) -> TransportFuture<'_, ()>;

    /// Resolve a URL for the sender's profile picture, if they have one.
    fn avatar_url(&self, sender: Sender) -> TransportFuture<'_, Option<String>>;
}
