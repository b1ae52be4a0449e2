//! Chat thread and message records.
//!
//! A `Chat` is owned by exactly one user and orders its messages oldest
//! first. A `Message` carries the user's input and, once generation has
//! finished, the assembled model response. `response` starts out as `None`
//! and is written exactly once by the streaming pipeline; readers must
//! tolerate observing it as `None` while generation is in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::foundation::{ChatId, MessageId, UserId};

/// Maximum characters of the last message shown in chat list previews.
pub const PREVIEW_LENGTH: usize = 50;

/// Lifecycle of a message's `response` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Generation has not completed; `response` is still null.
    Pending,
    /// Generation finished normally; `response` is the full concatenation.
    Complete,
    /// The stream failed mid-way; `response` holds the fragments received
    /// before the failure.
    Partial,
}

impl ResponseStatus {
    /// Stable string form used for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Pending => "pending",
            ResponseStatus::Complete => "complete",
            ResponseStatus::Partial => "partial",
        }
    }

    /// Parses the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ResponseStatus::Pending),
            "complete" => Some(ResponseStatus::Complete),
            "partial" => Some(ResponseStatus::Partial),
            _ => None,
        }
    }
}

/// A chat thread owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub user_id: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Monotonically non-decreasing; bumped whenever a message in this
    /// chat is finalized.
    pub updated_at: DateTime<Utc>,
}

/// A single user message, plus the generated response once available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Nullable so orphaned/legacy messages remain representable.
    pub chat_id: Option<ChatId>,
    pub user_id: UserId,
    pub content: String,
    /// Relative media path of an attached image, if any.
    pub image_ref: Option<String>,
    pub response: Option<String>,
    pub response_status: ResponseStatus,
    pub created_at: DateTime<Utc>,
}

/// List projection of a chat: no messages, but a count and a preview of
/// the most recent message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub id: ChatId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: i64,
    pub last_message: Option<String>,
}

/// Detail projection: the chat plus its messages, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct ChatDetail {
    pub chat: Chat,
    pub messages: Vec<Message>,
}

/// Truncates message content for list previews, respecting char boundaries.
pub fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_LENGTH).collect()
}
