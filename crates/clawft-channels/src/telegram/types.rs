//! Telegram Bot API types for deserialization.
//!
//! These types model the subset of the Telegram Bot API response format
//! needed by the [`TelegramClient`](super::client::TelegramClient).

use serde::{Deserialize, Serialize};

/// Wrapper for all Telegram Bot API responses.
///
/// Every API method returns `{ ok: bool, result?: T, description?: String }`.
/// When `ok` is `false`, `description` contains the error message.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramResponse<T> {
    /// Whether the request was successful.
    pub ok: bool,
    /// The result payload, present when `ok` is `true`.
    pub result: Option<T>,
    /// Human-readable error description, present when `ok` is `false`.
    pub description: Option<String>,
}

/// A single update from the `getUpdates` long-polling endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonically increasing update identifier.
    pub update_id: i64,
    /// The message associated with this update, if any.
    pub message: Option<Message>,
}

/// A Telegram message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Unique message identifier within the chat.
    pub message_id: i64,
    /// Sender of the message. Absent for messages in channels.
    pub from: Option<User>,
    /// Chat the message belongs to.
    pub chat: Chat,
    /// Text content of the message, if any.
    pub text: Option<String>,
    /// Unix timestamp of when the message was sent.
    pub date: i64,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// Whether this user is a bot.
    pub is_bot: bool,
    /// User's first name.
    pub first_name: String,
    /// User's username (without leading `@`), if set.
    pub username: Option<String>,
}

/// A Telegram chat (private, group, supergroup, or channel).
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Unique chat identifier.
    pub id: i64,
    /// Chat type: `"private"`, `"group"`, `"supergroup"`, or `"channel"`.
    #[serde(rename = "type")]
    pub chat_type: String,
    /// Title of the chat (for groups, supergroups, channels).
    pub title: Option<String>,
    /// Username of the chat (for private chats with usernames set).
    pub username: Option<String>,
}

/// Request body for the `sendMessage` API method.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    /// Target chat identifier.
    pub chat_id: i64,
    /// Text of the message to send.
    pub text: String,
    /// Parse mode for formatting (e.g., `"HTML"`, `"Markdown"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    /// If set, the sent message will be a reply to this message ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}
