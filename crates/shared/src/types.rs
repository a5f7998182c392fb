//! Chat domain types shared between the store and the API

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Identifiers
// =============================================================================

/// Generate a new opaque identifier for a chat, participant or message.
///
/// Identifiers are plain strings on the wire and in storage; callers must not
/// assume any structure beyond uniqueness.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Entities
// =============================================================================

/// A chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Chat {
    pub id: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Participants in insertion order; empty unless explicitly loaded
    #[sqlx(skip)]
    #[serde(default)]
    pub participants: Vec<ChatParticipant>,

    /// Most recent message, only populated by last-message listings
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
}

impl Chat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            created_at: OffsetDateTime::now_utc(),
            participants: Vec::new(),
            last_message: None,
        }
    }
}

/// Membership of an external user in a chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChatParticipant {
    pub id: String,
    pub chat_id: String,
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

/// A persisted chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Input for appending a message to a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
}
