//! Typed inbound events and the per-request card description.

/// Name drawn on the card when the platform gives no usable sender name.
pub const FALLBACK_SENDER_NAME: &str = "Unknown";

/// Identifies a message to reply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    /// Chat the message lives in.
    pub chat_id: i64,
    /// Message identifier within the chat.
    pub message_id: i64,
}

/// Author of a quoted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    /// Platform user id, absent for anonymous or channel posts.
    pub user_id: Option<i64>,
    /// Human-readable name, if the platform exposes one.
    pub display_name: Option<String>,
}

impl Sender {
    /// The display name, or [`FALLBACK_SENDER_NAME`] when missing or blank.
    #[must_use]
    pub fn name_or_fallback(&self) -> String {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_SENDER_NAME)
            .to_string()
    }
}

/// The earlier message a command replies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedMessage {
    /// Message text (or media caption); empty when the message has neither.
    pub text: String,
    /// Who wrote it.
    pub sender: Sender,
}

/// A message received from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Where replies go.
    pub reference: MessageRef,
    /// Message text.
    pub body: String,
    /// The message this one replies to, if any.
    pub quoted: Option<QuotedMessage>,
}

/// Where the avatar image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSource {
    /// Fetch from this URL.
    Url(String),
    /// Already-loaded encoded image bytes.
    Bytes(Vec<u8>),
}

/// Everything needed to draw one quote card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteCardRequest {
    /// Name drawn in the panel header.
    pub sender_name: String,
    /// Quoted text, wrapped inside the panel.
    pub text: String,
    /// Optional avatar drawn in the circle left of the panel.
    pub avatar: Option<AvatarSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_name_present() {
        let sender = Sender {
            user_id: Some(1),
            display_name: Some("Alice".into()),
        };
        assert_eq!(sender.name_or_fallback(), "Alice");
    }

    #[test]
    fn sender_name_fallback() {
        assert_eq!(Sender::default().name_or_fallback(), FALLBACK_SENDER_NAME);
        let blank = Sender {
            user_id: None,
            display_name: Some("   ".into()),
        };
        assert_eq!(blank.name_or_fallback(), FALLBACK_SENDER_NAME);
    }
}
