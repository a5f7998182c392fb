//! WebSocket connection handle
//!
//! The hub never writes to a socket directly. Each connection owns a bounded
//! queue drained by its writer task, and `send` only enqueues, so delivery to
//! one peer can never block the hub.

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use super::events::ServerEnvelope;

/// Why an envelope could not be queued for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("outbound queue is full")]
    QueueFull,
    #[error("connection is closed")]
    Closed,
}

/// Represents an active WebSocket connection
#[derive(Debug)]
pub struct Connection {
    /// Unique session ID for this connection
    pub session_id: Uuid,

    /// User bound at upgrade time from a validated token, if any
    pub user_id: Option<String>,

    /// Queue drained by the connection's writer task
    sender: mpsc::Sender<ServerEnvelope>,

    /// Flips to `true` once, when the connection is closed
    closed: watch::Sender<bool>,
}

impl Connection {
    pub fn new(user_id: Option<String>, sender: mpsc::Sender<ServerEnvelope>) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            sender,
            closed,
        }
    }

    /// Queue an envelope without waiting
    pub fn send(&self, envelope: ServerEnvelope) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        self.sender.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Ask the reader and writer tasks to shut down. Idempotent.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Receiver that observes the close signal
    pub fn closed_signal(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }

    /// Whether this connection belongs to one of `user_ids`
    pub fn is_bound_to_any(&self, user_ids: &std::collections::HashSet<String>) -> bool {
        self.user_id
            .as_ref()
            .is_some_and(|user_id| user_ids.contains(user_id))
    }
}
