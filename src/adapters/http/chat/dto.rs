//! Request/response DTOs for the chat endpoints.
//!
//! These are the explicit public field lists: internal columns (password
//! hashes, owner ids on nested messages) never leak through them by
//! accident.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::chat::{Chat, ChatDetail, ChatSummary, Message, ResponseStatus};
use crate::domain::foundation::{ChatId, MessageId, UserId};

/// Body for `POST /api/chats`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateChatRequest {
    /// Defaults to "New Chat" when omitted.
    pub title: Option<String>,
}

/// Body for `PUT /api/chats/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateChatRequest {
    pub title: String,
}

/// Public projection of a chat.
#[derive(Debug, Serialize)]
pub struct ChatView {
    pub id: ChatId,
    pub user_id: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Chat> for ChatView {
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id,
            user_id: chat.user_id,
            title: chat.title,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }
    }
}

/// List projection with message count and preview.
#[derive(Debug, Serialize)]
pub struct ChatSummaryView {
    pub id: ChatId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: i64,
    pub last_message: Option<String>,
}

impl From<ChatSummary> for ChatSummaryView {
    fn from(summary: ChatSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            message_count: summary.message_count,
            last_message: summary.last_message,
        }
    }
}

/// Public projection of a message.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: MessageId,
    pub chat_id: Option<ChatId>,
    pub content: String,
    pub image_ref: Option<String>,
    /// Null while generation is in flight.
    pub response: Option<String>,
    pub response_status: ResponseStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            chat_id: message.chat_id,
            content: message.content,
            image_ref: message.image_ref,
            response: message.response,
            response_status: message.response_status,
            created_at: message.created_at,
        }
    }
}

/// Detail projection: chat plus messages oldest-first.
#[derive(Debug, Serialize)]
pub struct ChatDetailView {
    pub id: ChatId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    pub messages: Vec<MessageView>,
}

impl From<ChatDetail> for ChatDetailView {
    fn from(detail: ChatDetail) -> Self {
        let messages: Vec<MessageView> =
            detail.messages.into_iter().map(MessageView::from).collect();
        Self {
            id: detail.chat.id,
            title: detail.chat.title,
            created_at: detail.chat.created_at,
            updated_at: detail.chat.updated_at,
            message_count: messages.len(),
            messages,
        }
    }
}
