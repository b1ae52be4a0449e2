//! PostgreSQL implementation of the message store port.
//!
//! Finalize runs the response write and the chat `updated_at` bump inside
//! a single transaction, so readers never observe one without the other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::chat::{preview, Chat, ChatDetail, ChatSummary, Message, ResponseStatus};
use crate::domain::foundation::{ChatId, MessageId, UserId};
use crate::ports::{MessageStore, StoreError};

/// PostgreSQL-backed message store.
#[derive(Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn chat_from_row(row: &sqlx::postgres::PgRow) -> Result<Chat, StoreError> {
    Ok(Chat {
        id: ChatId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_err)?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id").map_err(db_err)?),
        title: row.try_get("title").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn message_from_row(row: &sqlx::postgres::PgRow) -> Result<Message, StoreError> {
    let status: String = row.try_get("response_status").map_err(db_err)?;
    Ok(Message {
        id: MessageId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_err)?),
        chat_id: row
            .try_get::<Option<Uuid>, _>("chat_id")
            .map_err(db_err)?
            .map(ChatId::from_uuid),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id").map_err(db_err)?),
        content: row.try_get("content").map_err(db_err)?,
        image_ref: row.try_get("image_ref").map_err(db_err)?,
        response: row.try_get("response").map_err(db_err)?,
        response_status: ResponseStatus::parse(&status).ok_or_else(|| {
            StoreError::Database(format!("unknown response_status '{status}'"))
        })?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn create_chat(&self, owner_id: UserId, title: &str) -> Result<Chat, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO chats (id, user_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, user_id, title, created_at, updated_at
            "#,
        )
        .bind(ChatId::new().as_uuid())
        .bind(owner_id.as_uuid())
        .bind(title)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        chat_from_row(&row)
    }

    async fn list_chats(&self, owner_id: UserId) -> Result<Vec<ChatSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.title, c.created_at, c.updated_at,
                   COUNT(m.id) AS message_count,
                   (SELECT content FROM messages
                    WHERE chat_id = c.id
                    ORDER BY created_at DESC LIMIT 1) AS last_message
            FROM chats c
            LEFT JOIN messages m ON m.chat_id = c.id
            WHERE c.user_id = $1
            GROUP BY c.id
            ORDER BY c.updated_at DESC
            "#,
        )
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(ChatSummary {
                    id: ChatId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_err)?),
                    title: row.try_get("title").map_err(db_err)?,
                    created_at: row.try_get("created_at").map_err(db_err)?,
                    updated_at: row.try_get("updated_at").map_err(db_err)?,
                    message_count: row.try_get("message_count").map_err(db_err)?,
                    last_message: row
                        .try_get::<Option<String>, _>("last_message")
                        .map_err(db_err)?
                        .map(|content| preview(&content)),
                })
            })
            .collect()
    }

    async fn get_chat(&self, owner_id: UserId, chat_id: ChatId) -> Result<ChatDetail, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM chats
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(chat_id.as_uuid())
        .bind(owner_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(StoreError::NotFound)?;
        let chat = chat_from_row(&row)?;

        let rows = sqlx::query(
            r#"
            SELECT id, chat_id, user_id, content, image_ref, response,
                   response_status, created_at
            FROM messages
            WHERE chat_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(chat_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let messages = rows
            .iter()
            .map(message_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ChatDetail { chat, messages })
    }

    async fn rename_chat(
        &self,
        owner_id: UserId,
        chat_id: ChatId,
        title: &str,
    ) -> Result<Chat, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE chats
            SET title = $3, updated_at = $4
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, created_at, updated_at
            "#,
        )
        .bind(chat_id.as_uuid())
        .bind(owner_id.as_uuid())
        .bind(title)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(StoreError::NotFound)?;
        chat_from_row(&row)
    }

    async fn delete_chat(&self, owner_id: UserId, chat_id: ChatId) -> Result<(), StoreError> {
        // Messages cascade via the foreign key.
        let result = sqlx::query("DELETE FROM chats WHERE id = $1 AND user_id = $2")
            .bind(chat_id.as_uuid())
            .bind(owner_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_message(
        &self,
        chat_id: Option<ChatId>,
        user_id: UserId,
        content: &str,
        image_ref: Option<&str>,
    ) -> Result<Message, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO messages
                (id, chat_id, user_id, content, image_ref, response, response_status, created_at)
            VALUES ($1, $2, $3, $4, $5, NULL, 'pending', $6)
            RETURNING id, chat_id, user_id, content, image_ref, response,
                      response_status, created_at
            "#,
        )
        .bind(MessageId::new().as_uuid())
        .bind(chat_id.map(|c| *c.as_uuid()))
        .bind(user_id.as_uuid())
        .bind(content)
        .bind(image_ref)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        message_from_row(&row)
    }

    async fn finalize(&self, message_id: MessageId, response: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query(
            r#"
            UPDATE messages
            SET response = $2, response_status = 'complete'
            WHERE id = $1
            RETURNING chat_id
            "#,
        )
        .bind(message_id.as_uuid())
        .bind(response)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or(StoreError::NotFound)?;

        if let Some(chat_id) = row.try_get::<Option<Uuid>, _>("chat_id").map_err(db_err)? {
            sqlx::query("UPDATE chats SET updated_at = $2 WHERE id = $1")
                .bind(chat_id)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)
    }

    async fn persist_partial(
        &self,
        message_id: MessageId,
        partial: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET response = $2, response_status = 'partial'
            WHERE id = $1
            "#,
        )
        .bind(message_id.as_uuid())
        .bind(partial)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn touch_chat_updated_at(
        &self,
        chat_id: ChatId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE chats SET updated_at = $2 WHERE id = $1")
            .bind(chat_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
