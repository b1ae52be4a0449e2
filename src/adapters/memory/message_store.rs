//! In-memory implementation of the message store port.
//!
//! Backs unit and integration tests; mirrors the Postgres adapter's
//! semantics, including the atomic finalize (response write plus chat
//! timestamp bump) and ownership-scoped reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::domain::chat::{preview, Chat, ChatDetail, ChatSummary, Message, ResponseStatus};
use crate::domain::foundation::{ChatId, MessageId, UserId};
use crate::ports::{MessageStore, StoreError};

#[derive(Default)]
struct Inner {
    chats: Vec<Chat>,
    messages: Vec<Message>,
}

/// Thread-safe in-memory message store.
#[derive(Default)]
pub struct InMemoryMessageStore {
    inner: Mutex<Inner>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn create_chat(&self, owner_id: UserId, title: &str) -> Result<Chat, StoreError> {
        let now = Utc::now();
        let chat = Chat {
            id: ChatId::new(),
            user_id: owner_id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().unwrap().chats.push(chat.clone());
        Ok(chat)
    }

    async fn list_chats(&self, owner_id: UserId) -> Result<Vec<ChatSummary>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut summaries: Vec<ChatSummary> = inner
            .chats
            .iter()
            .filter(|c| c.user_id == owner_id)
            .map(|c| {
                let mut chat_messages: Vec<&Message> = inner
                    .messages
                    .iter()
                    .filter(|m| m.chat_id == Some(c.id))
                    .collect();
                chat_messages.sort_by_key(|m| m.created_at);
                ChatSummary {
                    id: c.id,
                    title: c.title.clone(),
                    created_at: c.created_at,
                    updated_at: c.updated_at,
                    message_count: chat_messages.len() as i64,
                    last_message: chat_messages.last().map(|m| preview(&m.content)),
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn get_chat(&self, owner_id: UserId, chat_id: ChatId) -> Result<ChatDetail, StoreError> {
        let inner = self.inner.lock().unwrap();
        let chat = inner
            .chats
            .iter()
            .find(|c| c.id == chat_id && c.user_id == owner_id)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.chat_id == Some(chat_id))
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(ChatDetail { chat, messages })
    }

    async fn rename_chat(
        &self,
        owner_id: UserId,
        chat_id: ChatId,
        title: &str,
    ) -> Result<Chat, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let chat = inner
            .chats
            .iter_mut()
            .find(|c| c.id == chat_id && c.user_id == owner_id)
            .ok_or(StoreError::NotFound)?;
        chat.title = title.to_string();
        chat.updated_at = Utc::now();
        Ok(chat.clone())
    }

    async fn delete_chat(&self, owner_id: UserId, chat_id: ChatId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.chats.len();
        inner
            .chats
            .retain(|c| !(c.id == chat_id && c.user_id == owner_id));
        if inner.chats.len() == before {
            return Err(StoreError::NotFound);
        }
        // Cascade.
        inner.messages.retain(|m| m.chat_id != Some(chat_id));
        Ok(())
    }

    async fn create_message(
        &self,
        chat_id: Option<ChatId>,
        user_id: UserId,
        content: &str,
        image_ref: Option<&str>,
    ) -> Result<Message, StoreError> {
        let message = Message {
            id: MessageId::new(),
            chat_id,
            user_id,
            content: content.to_string(),
            image_ref: image_ref.map(str::to_string),
            response: None,
            response_status: ResponseStatus::Pending,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().messages.push(message.clone());
        Ok(message)
    }

    async fn finalize(&self, message_id: MessageId, response: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let chat_id = {
            let message = inner
                .messages
                .iter_mut()
                .find(|m| m.id == message_id)
                .ok_or(StoreError::NotFound)?;
            message.response = Some(response.to_string());
            message.response_status = ResponseStatus::Complete;
            message.chat_id
        };
        if let Some(chat_id) = chat_id {
            if let Some(chat) = inner.chats.iter_mut().find(|c| c.id == chat_id) {
                chat.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn persist_partial(
        &self,
        message_id: MessageId,
        partial: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let message = inner
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or(StoreError::NotFound)?;
        message.response = Some(partial.to_string());
        message.response_status = ResponseStatus::Partial;
        Ok(())
    }

    async fn touch_chat_updated_at(
        &self,
        chat_id: ChatId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let chat = inner
            .chats
            .iter_mut()
            .find(|c| c.id == chat_id)
            .ok_or(StoreError::NotFound)?;
        chat.updated_at = at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chats_list_newest_updated_first() {
        let store = InMemoryMessageStore::new();
        let owner = UserId::new();
        let first = store.create_chat(owner, "first").await.unwrap();
        let second = store.create_chat(owner, "second").await.unwrap();
        let third = store.create_chat(owner, "third").await.unwrap();

        // Touch the oldest chat so it becomes the most recent.
        store
            .touch_chat_updated_at(first.id, Utc::now() + chrono::Duration::seconds(10))
            .await
            .unwrap();

        let listed = store.list_chats(owner).await.unwrap();
        let ids: Vec<ChatId> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, third.id, second.id]);
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_owner() {
        let store = InMemoryMessageStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        store.create_chat(alice, "mine").await.unwrap();
        store.create_chat(bob, "yours").await.unwrap();

        let listed = store.list_chats(alice).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "mine");
    }

    #[tokio::test]
    async fn messages_are_returned_oldest_first() {
        let store = InMemoryMessageStore::new();
        let owner = UserId::new();
        let chat = store.create_chat(owner, "ordered").await.unwrap();
        for content in ["one", "two", "three"] {
            store
                .create_message(Some(chat.id), owner, content, None)
                .await
                .unwrap();
        }

        let detail = store.get_chat(owner, chat.id).await.unwrap();
        let contents: Vec<&str> = detail.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn finalize_twice_with_same_value_is_harmless() {
        let store = InMemoryMessageStore::new();
        let owner = UserId::new();
        let chat = store.create_chat(owner, "idempotent").await.unwrap();
        let message = store
            .create_message(Some(chat.id), owner, "q", None)
            .await
            .unwrap();

        store.finalize(message.id, "X").await.unwrap();
        store.finalize(message.id, "X").await.unwrap();

        let detail = store.get_chat(owner, chat.id).await.unwrap();
        assert_eq!(detail.messages[0].response.as_deref(), Some("X"));
        assert_eq!(detail.messages[0].response_status, ResponseStatus::Complete);
    }

    #[tokio::test]
    async fn deleting_a_chat_cascades_to_its_messages() {
        let store = InMemoryMessageStore::new();
        let owner = UserId::new();
        let chat = store.create_chat(owner, "doomed").await.unwrap();
        store
            .create_message(Some(chat.id), owner, "gone soon", None)
            .await
            .unwrap();

        store.delete_chat(owner, chat.id).await.unwrap();

        assert!(matches!(
            store.get_chat(owner, chat.id).await,
            Err(StoreError::NotFound)
        ));
        assert!(store.inner.lock().unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn list_preview_truncates_last_message() {
        let store = InMemoryMessageStore::new();
        let owner = UserId::new();
        let chat = store.create_chat(owner, "previews").await.unwrap();
        store
            .create_message(Some(chat.id), owner, &"m".repeat(80), None)
            .await
            .unwrap();

        let listed = store.list_chats(owner).await.unwrap();
        assert_eq!(listed[0].message_count, 1);
        assert_eq!(listed[0].last_message.as_ref().unwrap().len(), 50);
    }
}
