//! PostgreSQL chat store

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

use super::{last_messages_per_chat, ChatStore};
use crate::error::StoreResult;
use crate::types::{Chat, ChatParticipant, Message, NewMessage};

/// sqlx-backed implementation of [`ChatStore`]
#[derive(Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn create_chat(&self, name: &str) -> StoreResult<String> {
        let id = sqlx::query_scalar::<_, String>("INSERT INTO chats (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(id)
    }

    async fn add_participant(&self, chat_id: &str, user_id: &str) -> StoreResult<()> {
        sqlx::query("INSERT INTO chat_participants (chat_id, user_id) VALUES ($1, $2)")
            .bind(chat_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn participants(&self, chat_id: &str) -> StoreResult<Vec<ChatParticipant>> {
        let rows = sqlx::query_as::<_, ChatParticipant>(
            r#"
            SELECT id, chat_id, user_id, joined_at
            FROM chat_participants
            WHERE chat_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn chats_for_user(&self, user_id: &str) -> StoreResult<Vec<Chat>> {
        let rows = sqlx::query_as::<_, Chat>(
            r#"
            SELECT c.id, c.name, c.created_at
            FROM chats c
            JOIN chat_participants cp ON c.id = cp.chat_id
            WHERE cp.user_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create_message(&self, message: NewMessage) -> StoreResult<Message> {
        let created = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (chat_id, sender_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, chat_id, sender_id, content, created_at
            "#,
        )
        .bind(&message.chat_id)
        .bind(&message.sender_id)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn messages_by_chat(&self, chat_id: &str) -> StoreResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, chat_id, sender_id, content, created_at
            FROM messages
            WHERE chat_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn last_message(&self, chat_id: &str) -> StoreResult<Option<Message>> {
        let row = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, chat_id, sender_id, content, created_at
            FROM messages
            WHERE chat_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn last_messages(&self, chat_ids: &[String]) -> StoreResult<HashMap<String, Message>> {
        if chat_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let batched = sqlx::query_as::<_, Message>(
            r#"
            SELECT DISTINCT ON (chat_id) id, chat_id, sender_id, content, created_at
            FROM messages
            WHERE chat_id = ANY($1)
            ORDER BY chat_id, created_at DESC, seq DESC
            "#,
        )
        .bind(chat_ids)
        .fetch_all(&self.pool)
        .await;

        match batched {
            Ok(rows) => Ok(rows.into_iter().map(|m| (m.chat_id.clone(), m)).collect()),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    chat_count = chat_ids.len(),
                    "Batched last-message query failed, falling back to per-chat lookups"
                );
                Ok(last_messages_per_chat(self, chat_ids).await)
            }
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};
    use crate::error::StoreError;

    async fn setup_store() -> PgChatStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url, 2).await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        PgChatStore::new(pool)
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_message_roundtrip_preserves_order() {
        let store = setup_store().await;
        let chat_id = store.create_chat("pg-order").await.unwrap();

        for i in 0..5 {
            store
                .create_message(NewMessage {
                    chat_id: chat_id.clone(),
                    sender_id: "u1".to_string(),
                    content: format!("msg {i}"),
                })
                .await
                .unwrap();
        }

        let messages = store.messages_by_chat(&chat_id).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg 0", "msg 1", "msg 2", "msg 3", "msg 4"]);

        let last = store.last_messages(&[chat_id.clone()]).await.unwrap();
        assert_eq!(last[&chat_id].content, "msg 4");
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_constraint_violations_map_to_store_errors() {
        let store = setup_store().await;
        let chat_id = store.create_chat("pg-constraints").await.unwrap();
        store.add_participant(&chat_id, "u1").await.unwrap();

        let duplicate = store.add_participant(&chat_id, "u1").await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

        let missing_chat = store.add_participant("no-such-chat", "u1").await;
        assert!(matches!(missing_chat, Err(StoreError::NotFound(_))));
    }
}
