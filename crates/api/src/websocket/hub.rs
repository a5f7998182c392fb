//! Connection registry and fan-out
//!
//! The hub is the single source of truth for which connections are open.
//! Register, unregister and broadcast all run under one exclusive lock, so a
//! broadcast sees a consistent snapshot: a connection registered while it runs
//! misses that broadcast but receives every later one.
//!
//! None of the operations suspend while holding the lock. Delivery only
//! enqueues onto the connection's bounded outbound queue; a full or closed
//! queue is a delivery failure, and the connection is closed and dropped.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::connection::Connection;
use super::events::ServerEnvelope;

/// Which registered connections are eligible for a broadcast
#[derive(Debug, Clone)]
pub enum Recipients {
    /// Every registered connection
    All,
    /// Only connections bound to one of these user ids
    Users(HashSet<String>),
}

impl Recipients {
    fn includes(&self, conn: &Connection) -> bool {
        match self {
            Recipients::All => true,
            Recipients::Users(user_ids) => conn.is_bound_to_any(user_ids),
        }
    }
}

/// Outcome of a single broadcast
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the envelope was queued for
    pub delivered: usize,
    /// Connections dropped because delivery failed
    pub dropped: Vec<Uuid>,
}

/// Registry of live WebSocket connections, shared through `AppState`
#[derive(Clone, Default)]
pub struct Hub {
    connections: Arc<Mutex<HashMap<Uuid, Arc<Connection>>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<Connection>>> {
        // A panic elsewhere must not take the registry down with it
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection. Returns `false` if it was already registered.
    pub fn register(&self, conn: Arc<Connection>) -> bool {
        let mut connections = self.lock();
        if connections.contains_key(&conn.session_id) {
            return false;
        }

        let session_id = conn.session_id;
        let user_id = conn.user_id.clone();
        connections.insert(session_id, conn);

        tracing::info!(
            session_id = %session_id,
            user_id = ?user_id,
            total_connections = connections.len(),
            "WebSocket connection registered"
        );
        true
    }

    /// Remove a connection. Returns `false` if it was not registered.
    pub fn unregister(&self, session_id: &Uuid) -> bool {
        let mut connections = self.lock();
        match connections.remove(session_id) {
            Some(conn) => {
                tracing::info!(
                    session_id = %session_id,
                    user_id = ?conn.user_id,
                    remaining_connections = connections.len(),
                    "WebSocket connection unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Send `envelope` to every eligible connection except `exclude`.
    ///
    /// A connection whose queue rejects the envelope is closed and removed;
    /// delivery to the remaining connections continues.
    pub fn broadcast(
        &self,
        envelope: &ServerEnvelope,
        exclude: Option<Uuid>,
        recipients: &Recipients,
    ) -> BroadcastReport {
        let mut connections = self.lock();
        let mut report = BroadcastReport::default();

        for (session_id, conn) in connections.iter() {
            if Some(*session_id) == exclude || !recipients.includes(conn) {
                continue;
            }

            match conn.send(envelope.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Failed to deliver to connection, closing it"
                    );
                    conn.close();
                    report.dropped.push(*session_id);
                }
            }
        }

        for session_id in &report.dropped {
            connections.remove(session_id);
        }

        tracing::debug!(
            recipients = report.delivered,
            dropped = report.dropped.len(),
            "Broadcast envelope"
        );

        report
    }

    pub fn connection_count(&self) -> usize {
        self.lock().len()
    }

    /// Get statistics about the registry
    pub fn stats(&self) -> HubStats {
        let connections = self.lock();
        HubStats {
            active_connections: connections.len(),
            authenticated_connections: connections.values().filter(|c| c.user_id.is_some()).count(),
        }
    }
}

/// Statistics about WebSocket connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubStats {
    pub active_connections: usize,
    /// Connections with a bound user identity
    pub authenticated_connections: usize,
}
