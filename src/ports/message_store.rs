//! Message store port - durable CRUD for chats and messages.
//!
//! All read operations are ownership-scoped: a chat id that does not
//! resolve under the caller's ownership is indistinguishable from a chat
//! that does not exist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::chat::{Chat, ChatDetail, ChatSummary, Message};
use crate::domain::foundation::{ChatId, MessageId, UserId};

/// Errors from the message store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The chat or message does not exist under the caller's ownership.
    #[error("not found")]
    NotFound,

    /// The underlying storage failed.
    #[error("storage error: {0}")]
    Database(String),
}

/// Port for chat/message persistence.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Creates a chat owned by `owner_id`.
    async fn create_chat(&self, owner_id: UserId, title: &str) -> Result<Chat, StoreError>;

    /// Lists the owner's chats, newest `updated_at` first.
    async fn list_chats(&self, owner_id: UserId) -> Result<Vec<ChatSummary>, StoreError>;

    /// Returns a chat with its messages oldest-first, or `NotFound` if the
    /// chat does not exist or is not owned by `owner_id`.
    async fn get_chat(&self, owner_id: UserId, chat_id: ChatId) -> Result<ChatDetail, StoreError>;

    /// Renames a chat.
    async fn rename_chat(
        &self,
        owner_id: UserId,
        chat_id: ChatId,
        title: &str,
    ) -> Result<Chat, StoreError>;

    /// Deletes a chat; its messages cascade with it.
    async fn delete_chat(&self, owner_id: UserId, chat_id: ChatId) -> Result<(), StoreError>;

    /// Persists a new message with `response = null`, before generation
    /// starts.
    async fn create_message(
        &self,
        chat_id: Option<ChatId>,
        user_id: UserId,
        content: &str,
        image_ref: Option<&str>,
    ) -> Result<Message, StoreError>;

    /// Writes the fully-accumulated response and, in the same transaction,
    /// bumps the owning chat's `updated_at`.
    ///
    /// Idempotent in intent: calling twice with the same value is harmless.
    async fn finalize(&self, message_id: MessageId, response: &str) -> Result<(), StoreError>;

    /// Writes a partial response after a mid-stream failure, marked
    /// [`ResponseStatus::Partial`](crate::domain::chat::ResponseStatus).
    /// Does not touch the chat's `updated_at`.
    async fn persist_partial(&self, message_id: MessageId, partial: &str)
        -> Result<(), StoreError>;

    /// Sets a chat's `updated_at` to `at`.
    async fn touch_chat_updated_at(&self, chat_id: ChatId, at: DateTime<Utc>)
        -> Result<(), StoreError>;
}
