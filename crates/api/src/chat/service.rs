//! Chat business logic
//!
//! Translates REST and WebSocket requests into [`ChatStore`] calls. The
//! service does not retry; store failures propagate to the caller.

use std::sync::Arc;

use familyflow_shared::{Chat, ChatParticipant, ChatStore, Message, NewMessage, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Chat was created but not every participant could be added.
    /// The chat and the participants in `added` remain persisted.
    #[error("chat {chat_id} created but adding participant {failed_user_id} failed: {source}")]
    Incomplete {
        chat_id: String,
        added: Vec<String>,
        failed_user_id: String,
        #[source]
        source: StoreError,
    },
}

pub type ChatResult<T> = Result<T, ChatError>;

/// Chat service shared by REST handlers and the WebSocket hub
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ChatStore>,
}

impl ChatService {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ChatStore> {
        &self.store
    }

    /// Create an empty chat. The name is validated by the caller.
    pub async fn create_chat(&self, name: &str) -> ChatResult<String> {
        let chat_id = self.store.create_chat(name).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to create chat");
            e
        })?;

        tracing::info!(chat_id = %chat_id, "Chat created");
        Ok(chat_id)
    }

    pub async fn add_participant(&self, chat_id: &str, user_id: &str) -> ChatResult<()> {
        self.store
            .add_participant(chat_id, user_id)
            .await
            .map_err(|e| {
                tracing::error!(chat_id = %chat_id, user_id = %user_id, error = %e, "Failed to add participant");
                e
            })?;

        tracing::info!(chat_id = %chat_id, user_id = %user_id, "Participant added");
        Ok(())
    }

    /// Create a chat and add each participant in order.
    ///
    /// Not atomic: on the first failing participant the chat and the
    /// participants added so far stay persisted and [`ChatError::Incomplete`]
    /// reports what was done.
    pub async fn create_chat_with_participants(
        &self,
        name: &str,
        participant_ids: &[String],
    ) -> ChatResult<String> {
        let chat_id = self.create_chat(name).await?;
        let mut added = Vec::with_capacity(participant_ids.len());

        for user_id in participant_ids {
            if let Err(source) = self.store.add_participant(&chat_id, user_id).await {
                tracing::error!(
                    chat_id = %chat_id,
                    user_id = %user_id,
                    added = added.len(),
                    error = %source,
                    "Failed to add participant, chat left partially populated"
                );
                return Err(ChatError::Incomplete {
                    chat_id,
                    added,
                    failed_user_id: user_id.clone(),
                    source,
                });
            }
            added.push(user_id.clone());
        }

        tracing::info!(chat_id = %chat_id, participants = added.len(), "Chat created with participants");
        Ok(chat_id)
    }

    /// Persist a message and return the stored row, ready to broadcast as-is
    pub async fn create_message(&self, message: NewMessage) -> ChatResult<Message> {
        let created = self.store.create_message(message).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to create message");
            e
        })?;

        tracing::debug!(message_id = %created.id, chat_id = %created.chat_id, "Message created");
        Ok(created)
    }

    /// Full chat history, oldest first. No pagination.
    pub async fn messages_by_chat(&self, chat_id: &str) -> ChatResult<Vec<Message>> {
        Ok(self.store.messages_by_chat(chat_id).await?)
    }

    pub async fn participants(&self, chat_id: &str) -> ChatResult<Vec<ChatParticipant>> {
        Ok(self.store.participants(chat_id).await?)
    }

    /// Chats of a user with their participant lists loaded
    pub async fn chats_with_participants(&self, user_id: &str) -> ChatResult<Vec<Chat>> {
        let mut chats = self.store.chats_for_user(user_id).await?;

        for chat in &mut chats {
            chat.participants = self.store.participants(&chat.id).await?;
        }

        Ok(chats)
    }

    /// Chats of a user, each enriched with its most recent message.
    ///
    /// A failed last-message lookup never fails the call; the chat is returned
    /// without `last_message`.
    pub async fn chats_with_last_message(&self, user_id: &str) -> ChatResult<Vec<Chat>> {
        let mut chats = self.store.chats_for_user(user_id).await?;
        let chat_ids: Vec<String> = chats.iter().map(|c| c.id.clone()).collect();

        let mut last = match self.store.last_messages(&chat_ids).await {
            Ok(last) => last,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to load last messages");
                Default::default()
            }
        };

        for chat in &mut chats {
            chat.last_message = last.remove(&chat.id);
        }

        Ok(chats)
    }

    /// User ids participating in a chat
    pub async fn participant_user_ids(&self, chat_id: &str) -> ChatResult<Vec<String>> {
        Ok(self
            .store
            .participants(chat_id)
            .await?
            .into_iter()
            .map(|p| p.user_id)
            .collect())
    }
}
