//! Process-local chat store
//!
//! Keeps everything behind a single `RwLock`. Message timestamps are clamped
//! so they never go backwards, which keeps per-chat history ordered even if the
//! wall clock is adjusted.

use async_trait::async_trait;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::ChatStore;
use crate::error::{StoreError, StoreResult};
use crate::types::{new_id, Chat, ChatParticipant, Message, NewMessage};

#[derive(Default)]
struct Inner {
    /// Chats in creation order
    chats: Vec<Chat>,
    /// Participants in insertion order
    participants: Vec<ChatParticipant>,
    /// chat_id -> messages in insertion order
    messages: HashMap<String, Vec<Message>>,
    last_timestamp: Option<OffsetDateTime>,
}

impl Inner {
    fn chat_exists(&self, chat_id: &str) -> bool {
        self.chats.iter().any(|c| c.id == chat_id)
    }

    fn next_timestamp(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let ts = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

/// In-memory implementation of [`ChatStore`]
#[derive(Default)]
pub struct InMemoryChatStore {
    inner: RwLock<Inner>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn create_chat(&self, name: &str) -> StoreResult<String> {
        let mut inner = self.inner.write().await;
        let mut chat = Chat::new(name);
        chat.created_at = inner.next_timestamp();
        let id = chat.id.clone();
        inner.chats.push(chat);
        Ok(id)
    }

    async fn add_participant(&self, chat_id: &str, user_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        if !inner.chat_exists(chat_id) {
            return Err(StoreError::NotFound(format!("chat {chat_id}")));
        }
        if inner
            .participants
            .iter()
            .any(|p| p.chat_id == chat_id && p.user_id == user_id)
        {
            return Err(StoreError::Conflict(format!(
                "user {user_id} already participates in chat {chat_id}"
            )));
        }

        let joined_at = inner.next_timestamp();
        inner.participants.push(ChatParticipant {
            id: new_id(),
            chat_id: chat_id.to_string(),
            user_id: user_id.to_string(),
            joined_at,
        });
        Ok(())
    }

    async fn participants(&self, chat_id: &str) -> StoreResult<Vec<ChatParticipant>> {
        let inner = self.inner.read().await;
        Ok(inner
            .participants
            .iter()
            .filter(|p| p.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn chats_for_user(&self, user_id: &str) -> StoreResult<Vec<Chat>> {
        let inner = self.inner.read().await;
        Ok(inner
            .chats
            .iter()
            .filter(|c| {
                inner
                    .participants
                    .iter()
                    .any(|p| p.chat_id == c.id && p.user_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn create_message(&self, message: NewMessage) -> StoreResult<Message> {
        let mut inner = self.inner.write().await;

        if !inner.chat_exists(&message.chat_id) {
            return Err(StoreError::NotFound(format!("chat {}", message.chat_id)));
        }

        let created = Message {
            id: new_id(),
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            content: message.content,
            created_at: inner.next_timestamp(),
        };
        inner
            .messages
            .entry(created.chat_id.clone())
            .or_default()
            .push(created.clone());

        Ok(created)
    }

    async fn messages_by_chat(&self, chat_id: &str) -> StoreResult<Vec<Message>> {
        let inner = self.inner.read().await;
        Ok(inner.messages.get(chat_id).cloned().unwrap_or_default())
    }

    async fn last_message(&self, chat_id: &str) -> StoreResult<Option<Message>> {
        let inner = self.inner.read().await;
        Ok(inner.messages.get(chat_id).and_then(|m| m.last()).cloned())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
