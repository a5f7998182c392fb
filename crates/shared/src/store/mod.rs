//! Chat/message persistence contract
//!
//! The chat service only talks to storage through [`ChatStore`]. Two
//! implementations ship with the crate:
//!
//! - [`PgChatStore`]: PostgreSQL via sqlx, used in production
//! - [`InMemoryChatStore`]: process-local store for development and tests
//!
//! Messages are append-only. For a given chat they are ordered by `created_at`
//! ascending with ties broken by insertion order, and every listing preserves
//! that order.

mod memory;
mod postgres;

pub use memory::InMemoryChatStore;
pub use postgres::PgChatStore;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::StoreResult;
use crate::types::{Chat, ChatParticipant, Message, NewMessage};

#[async_trait]
pub trait ChatStore: Send + Sync + 'static {
    /// Insert a chat and return its generated id
    async fn create_chat(&self, name: &str) -> StoreResult<String>;

    /// Insert a participant row.
    ///
    /// Fails with `NotFound` if the chat does not exist and with `Conflict`
    /// if the user already participates in the chat.
    async fn add_participant(&self, chat_id: &str, user_id: &str) -> StoreResult<()>;

    /// Participants of a chat in insertion order
    async fn participants(&self, chat_id: &str) -> StoreResult<Vec<ChatParticipant>>;

    /// All chats the user participates in, oldest first
    async fn chats_for_user(&self, user_id: &str) -> StoreResult<Vec<Chat>>;

    /// Append a message and return the fully populated row
    async fn create_message(&self, message: NewMessage) -> StoreResult<Message>;

    /// Full history of a chat in chronological order
    async fn messages_by_chat(&self, chat_id: &str) -> StoreResult<Vec<Message>>;

    async fn last_message(&self, chat_id: &str) -> StoreResult<Option<Message>>;

    /// Last message of each chat in `chat_ids`.
    ///
    /// Chats without messages, and chats whose lookup failed, are absent from
    /// the returned map.
    async fn last_messages(&self, chat_ids: &[String]) -> StoreResult<HashMap<String, Message>> {
        Ok(last_messages_per_chat(self, chat_ids).await)
    }

    /// Connectivity probe used by readiness checks
    async fn ping(&self) -> StoreResult<()>;
}

/// Look up the last message of each chat one at a time, skipping failures.
pub async fn last_messages_per_chat<S>(store: &S, chat_ids: &[String]) -> HashMap<String, Message>
where
    S: ChatStore + ?Sized,
{
    let mut found = HashMap::with_capacity(chat_ids.len());

    for chat_id in chat_ids {
        match store.last_message(chat_id).await {
            Ok(Some(message)) => {
                found.insert(chat_id.clone(), message);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    chat_id = %chat_id,
                    error = %e,
                    "Failed to load last message, returning chat without it"
                );
            }
        }
    }

    found
}
