//! Live adapter for the Telegram Bot API.
//!
//! Talks to the Bot API over plain HTTPS: `getUpdates` long polling for
//! inbound messages, `sendMessage`/`sendSticker` for replies, and
//! `getUserProfilePhotos` + `getFile` to locate avatars.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::QuoteError;
use crate::model::{InboundMessage, MessageRef, QuotedMessage, Sender};
use crate::ports::transport::{ChatTransport, TransportFuture};
use crate::sticker::STICKER_MIME;

/// Smallest profile photo edge worth downloading for the 80px avatar box.
const MIN_AVATAR_EDGE: u32 = 80;

/// Extra time on top of the long-poll timeout before the HTTP request gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Telegram Bot API client.
pub struct TelegramClient {
    client: Client,
    api_url: String,
    token: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    /// Create a client for the bot identified by `token`.
    #[must_use]
    pub fn new(api_url: &str, token: String, poll_timeout_secs: u64) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            poll_timeout_secs,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{file_path}", self.api_url, self.token)
    }

    /// Call a JSON method and unwrap the `result` field.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, QuoteError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        parse_response(response).await
    }

    /// Receive pending updates starting at `offset`, waiting up to the poll timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, QuoteError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(self.poll_timeout_secs) + POLL_GRACE)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        parse_response(response).await
    }

    /// Fetch the bot's own account.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the API is unreachable.
    pub async fn get_me(&self) -> Result<User, QuoteError> {
        self.call("getMe", &serde_json::json!({})).await
    }
}

/// Decode a Bot API envelope, turning `ok: false` into [`QuoteError::Api`].
async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, QuoteError> {
    let status = response.status();
    let text = response.text().await.map_err(reqwest::Error::without_url)?;
    let envelope: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| QuoteError::Api {
        status: status.as_u16(),
        message: format!("Failed to parse response: {e}"),
    })?;
    match envelope {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse {
            description,
            error_code,
            ..
        } => Err(QuoteError::Api {
            status: error_code.unwrap_or(status.as_u16()),
            message: description.unwrap_or_else(|| "request failed".to_string()),
        }),
    }
}

fn reply_parameters(to: MessageRef) -> serde_json::Value {
    serde_json::json!({ "message_id": to.message_id, "allow_sending_without_reply": true })
}

impl ChatTransport for TelegramClient {
    fn reply_text(&self, to: MessageRef, text: String) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let body = serde_json::json!({
                "chat_id": to.chat_id,
                "text": text,
                "reply_parameters": reply_parameters(to),
            });
            let _: serde_json::Value = self.call("sendMessage", &body).await?;
            Ok(())
        })
    }

    fn send_sticker(&self, to: MessageRef, sticker: Vec<u8>) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let part = Part::bytes(sticker)
                .file_name("quote.webp")
                .mime_str(STICKER_MIME)?;
            let form = Form::new()
                .text("chat_id", to.chat_id.to_string())
                .text("reply_parameters", reply_parameters(to).to_string())
                .part("sticker", part);

            let response = self
                .client
                .post(self.method_url("sendSticker"))
                .multipart(form)
                .send()
                .await
                .map_err(reqwest::Error::without_url)?;
            let _: serde_json::Value = parse_response(response).await?;
            Ok(())
        })
    }

    fn avatar_url(&self, sender: Sender) -> TransportFuture<'_, Option<String>> {
        Box::pin(async move {
            let Some(user_id) = sender.user_id else {
                return Ok(None);
            };

            let photos: UserProfilePhotos = self
                .call(
                    "getUserProfilePhotos",
                    &serde_json::json!({ "user_id": user_id, "limit": 1 }),
                )
                .await?;
            let Some(sizes) = photos.photos.first() else {
                return Ok(None);
            };
            let Some(size) = pick_avatar_size(sizes) else {
                return Ok(None);
            };

            let file: File = self
                .call("getFile", &serde_json::json!({ "file_id": size.file_id }))
                .await?;
            Ok(file.file_path.map(|path| self.file_url(&path)))
        })
    }
}

/// The smallest size covering the avatar box, or the largest available.
fn pick_avatar_size(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes
        .iter()
        .filter(|s| s.width.min(s.height) >= MIN_AVATAR_EDGE)
        .min_by_key(|s| s.width * s.height)
        .or_else(|| sizes.iter().max_by_key(|s| s.width * s.height))
}

/// Human-readable name: first + last name, else the username.
fn display_name(user: &User) -> Option<String> {
    let full = match &user.last_name {
        Some(last) => format!("{} {last}", user.first_name),
        None => user.first_name.clone(),
    };
    let full = full.trim();
    if full.is_empty() {
        user.username.clone()
    } else {
        Some(full.to_string())
    }
}

impl From<&Message> for Sender {
    fn from(message: &Message) -> Self {
        match &message.from {
            Some(user) => Self {
                user_id: Some(user.id),
                display_name: display_name(user),
            },
            // Anonymous admins and channel posts carry the chat instead of a user.
            None => Self {
                user_id: None,
                display_name: message.sender_chat.as_ref().and_then(|c| c.title.clone()),
            },
        }
    }
}

impl Message {
    fn text_or_caption(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// Convert into the platform-neutral inbound message.
    #[must_use]
    pub fn to_inbound(&self) -> InboundMessage {
        InboundMessage {
            reference: MessageRef {
                chat_id: self.chat.id,
                message_id: self.message_id,
            },
            body: self.text_or_caption().unwrap_or_default().to_string(),
            quoted: self.reply_to_message.as_deref().map(|quoted| QuotedMessage {
                text: quoted.text_or_caption().unwrap_or_default().to_string(),
                sender: Sender::from(quoted),
            }),
        }
    }
}

// --- Bot API types ---

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

/// One entry from `getUpdates`.
#[derive(Debug, Deserialize)]
pub struct Update {
    /// Monotonic update identifier; the next poll offset is this plus one.
    pub update_id: i64,
    /// New incoming message, if this update carries one.
    pub message: Option<Message>,
}

/// A Telegram message.
#[derive(Debug, Deserialize)]
pub struct Message {
    message_id: i64,
    chat: Chat,
    from: Option<User>,
    sender_chat: Option<Chat>,
    text: Option<String>,
    caption: Option<String>,
    reply_to_message: Option<Box<Message>>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
    title: Option<String>,
}

/// A Telegram user or bot account.
#[derive(Debug, Deserialize)]
pub struct User {
    id: i64,
    first_name: String,
    last_name: Option<String>,
    /// Login handle without the leading `@`.
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserProfilePhotos {
    photos: Vec<Vec<PhotoSize>>,
}

#[derive(Debug, Deserialize)]
struct PhotoSize {
    file_id: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct File {
    file_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn method_and_file_urls() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:abc".into(), 30);
        assert_eq!(
            client.method_url("sendSticker"),
            "https://api.telegram.org/bot123:abc/sendSticker"
        );
        assert_eq!(
            client.file_url("photos/file_1.jpg"),
            "https://api.telegram.org/file/bot123:abc/photos/file_1.jpg"
        );
    }

    #[test]
    fn reply_with_quote_becomes_inbound() {
        let update = update(
            r#"{
                "update_id": 42,
                "message": {
                    "message_id": 7,
                    "chat": {"id": -100, "type": "supergroup", "title": "Friends"},
                    "from": {"id": 1, "is_bot": false, "first_name": "Bob"},
                    "text": "/quote",
                    "reply_to_message": {
                        "message_id": 5,
                        "chat": {"id": -100, "type": "supergroup"},
                        "from": {"id": 2, "is_bot": false, "first_name": "Alice", "last_name": "Liddell", "username": "alice"},
                        "text": "hello world"
                    }
                }
            }"#,
        );
        assert_eq!(update.update_id, 42);
        let inbound = update.message.unwrap().to_inbound();
        assert_eq!(inbound.reference.chat_id, -100);
        assert_eq!(inbound.reference.message_id, 7);
        assert_eq!(inbound.body, "/quote");
        let quoted = inbound.quoted.unwrap();
        assert_eq!(quoted.text, "hello world");
        assert_eq!(quoted.sender.user_id, Some(2));
        assert_eq!(quoted.sender.display_name.as_deref(), Some("Alice Liddell"));
    }

    #[test]
    fn message_without_reply_has_no_quote() {
        let update = update(
            r#"{"update_id": 1, "message": {"message_id": 3, "chat": {"id": 9, "type": "private"},
                "from": {"id": 9, "is_bot": false, "first_name": "Eve"}, "text": "/quote"}}"#,
        );
        let inbound = update.message.unwrap().to_inbound();
        assert!(inbound.quoted.is_none());
    }

    #[test]
    fn quoted_photo_uses_caption_and_channel_title() {
        let update = update(
            r#"{"update_id": 2, "message": {"message_id": 4, "chat": {"id": 9, "type": "group"},
                "text": "/quote",
                "reply_to_message": {"message_id": 1, "chat": {"id": 9, "type": "group"},
                    "sender_chat": {"id": -5, "type": "channel", "title": "News"},
                    "photo": [], "caption": "breaking"}}}"#,
        );
        let quoted = update.message.unwrap().to_inbound().quoted.unwrap();
        assert_eq!(quoted.text, "breaking");
        assert_eq!(quoted.sender.user_id, None);
        assert_eq!(quoted.sender.display_name.as_deref(), Some("News"));
    }

    fn user(first_name: &str, username: Option<&str>) -> User {
        User {
            id: 1,
            first_name: first_name.to_string(),
            last_name: None,
            username: username.map(str::to_string),
        }
    }

    fn square(file_id: &str, edge: u32) -> PhotoSize {
        PhotoSize {
            file_id: file_id.to_string(),
            width: edge,
            height: edge,
        }
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let ghost = user(" ", Some("ghost"));
        assert_eq!(display_name(&ghost).as_deref(), Some("ghost"));
        let ann = user("Ann", None);
        assert_eq!(display_name(&ann).as_deref(), Some("Ann"));
    }

    #[test]
    fn picks_smallest_photo_covering_avatar_box() {
        let sizes = vec![square("s", 160), square("m", 320), square("l", 640)];
        assert_eq!(pick_avatar_size(&sizes).unwrap().file_id, "s");

        let tiny = vec![square("a", 40), square("b", 64)];
        assert_eq!(pick_avatar_size(&tiny).unwrap().file_id, "b");
        assert!(pick_avatar_size(&[]).is_none());
    }

    #[test]
    fn api_error_envelope_parses() {
        let envelope: ApiResponse<serde_json::Value> = serde_json::from_str(
            r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#,
        )
        .unwrap();
        assert!(!envelope.ok);
        assert_eq!(envelope.error_code, Some(401));
        assert_eq!(envelope.description.as_deref(), Some("Unauthorized"));
    }
}
