//! WebSocket handler for Axum
//!
//! Owns one connection end-to-end: upgrade, registration, the read loop,
//! action dispatch and cleanup.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
};
use futures::{stream::StreamExt, Sink, SinkExt};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use familyflow_shared::NewMessage;

use crate::config::BroadcastScope;
use crate::state::AppState;

use super::{
    connection::Connection,
    events::{
        ClientEnvelope, GetMessagesData, SendMessageData, ServerEnvelope, ACTION_GET_MESSAGES,
        ACTION_SEND_MESSAGE, ERR_INVALID_FORMAT, ERR_UNKNOWN_ACTION,
    },
    hub::{Hub, Recipients},
};

/// How long the writer gets to flush and send a close frame after the reader exits
const WRITER_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    /// Optional access token; when valid, binds the user to the connection
    token: Option<String>,
}

/// WebSocket handler - upgrades HTTP connection to WebSocket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WebSocketQuery>,
) -> Result<Response, StatusCode> {
    let user_id = match params.token.as_deref() {
        Some(token) => match state.jwt_manager.validate_access_token(token) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket auth failed: invalid token");
                return Err(StatusCode::UNAUTHORIZED);
            }
        },
        None => None,
    };

    tracing::info!(user_id = ?user_id, "WebSocket connection upgrade requested");

    Ok(ws
        .on_failed_upgrade(|e| {
            tracing::error!(error = %e, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| handle_socket(socket, user_id, state)))
}

/// Unregisters and closes the connection when dropped, whichever way the
/// read loop ends
struct Registration {
    hub: Hub,
    conn: Arc<Connection>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.hub.unregister(&self.conn.session_id);
        self.conn.close();
        tracing::info!(session_id = %self.conn.session_id, "WebSocket connection closed");
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, user_id: Option<String>, state: AppState) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::channel::<ServerEnvelope>(state.config.ws_outbound_buffer);
    let conn = Arc::new(Connection::new(user_id, tx));
    let session_id = conn.session_id;

    let mut reader_closed = conn.closed_signal();
    let writer_closed = conn.closed_signal();

    state.hub.register(Arc::clone(&conn));
    let registration = Registration {
        hub: state.hub.clone(),
        conn: Arc::clone(&conn),
    };

    let mut send_task = tokio::spawn(write_outbound(sender, rx, writer_closed, Arc::clone(&conn)));

    loop {
        let frame = tokio::select! {
            frame = receiver.next() => frame,
            _ = reader_closed.changed() => {
                tracing::info!(session_id = %session_id, "WebSocket connection closed by server");
                break;
            }
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                handle_text_frame(&text, &conn, &state).await;
            }
            Some(Ok(Message::Close(_))) => {
                tracing::info!(session_id = %session_id, "WebSocket close frame received");
                break;
            }
            Some(Ok(_)) => {
                // Binary frames are ignored; axum answers pings itself
            }
            Some(Err(e)) => {
                tracing::warn!(session_id = %session_id, error = %e, "WebSocket read failed");
                break;
            }
            None => break,
        }
    }

    drop(registration);

    if tokio::time::timeout(WRITER_SHUTDOWN_GRACE, &mut send_task)
        .await
        .is_err()
    {
        send_task.abort();
    }
}

/// Drain the outbound queue into the socket until the connection is closed.
///
/// Envelopes already queued when the close signal fires are still written
/// before the close frame.
async fn write_outbound<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<ServerEnvelope>,
    mut closed: watch::Receiver<bool>,
    conn: Arc<Connection>,
) where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    loop {
        tokio::select! {
            biased;

            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                match serde_json::to_string(&envelope) {
                    Ok(json) => {
                        if let Err(e) = sink.send(Message::Text(json)).await {
                            tracing::warn!(session_id = %conn.session_id, error = %e, "WebSocket write failed");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Failed to serialize WebSocket envelope");
                    }
                }
            }
            _ = closed.changed() => break,
        }
    }

    // A failed write also ends the reader
    conn.close();
    let _ = sink.send(Message::Close(None)).await;
    let _ = sink.close().await;
}

/// Decode one inbound text frame and dispatch its action
async fn handle_text_frame(text: &str, conn: &Arc<Connection>, state: &AppState) {
    let envelope = match serde_json::from_str::<ClientEnvelope>(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(
                session_id = %conn.session_id,
                error = %e,
                "Failed to parse client envelope"
            );
            reply(conn, ServerEnvelope::error(ERR_INVALID_FORMAT));
            return;
        }
    };

    tracing::debug!(session_id = %conn.session_id, action = %envelope.action, "Processing action");

    match envelope.action.as_str() {
        ACTION_SEND_MESSAGE => handle_send_message(envelope.data, conn, state).await,
        ACTION_GET_MESSAGES => handle_get_messages(envelope.data, conn, state).await,
        other => {
            tracing::warn!(session_id = %conn.session_id, action = %other, "Unknown action");
            reply(conn, ServerEnvelope::error(ERR_UNKNOWN_ACTION));
        }
    }
}

/// Persist a message, then fan it out to every other eligible connection
async fn handle_send_message(data: Value, conn: &Arc<Connection>, state: &AppState) {
    let input = match serde_json::from_value::<SendMessageData>(data) {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!(session_id = %conn.session_id, error = %e, "Invalid send_message payload");
            reply(conn, ServerEnvelope::error("Invalid input for send_message"));
            return;
        }
    };

    if let Some(bound) = &conn.user_id {
        if *bound != input.sender_id {
            tracing::warn!(
                session_id = %conn.session_id,
                user_id = %bound,
                sender_id = %input.sender_id,
                "Rejected message with mismatched sender"
            );
            reply(
                conn,
                ServerEnvelope::error("sender_id does not match the authenticated user"),
            );
            return;
        }
    }

    let message = match state
        .chat_service
        .create_message(NewMessage {
            chat_id: input.chat_id,
            sender_id: input.sender_id,
            content: input.content,
        })
        .await
    {
        Ok(message) => message,
        Err(e) => {
            reply(conn, ServerEnvelope::error(format!("Failed to send message: {e}")));
            return;
        }
    };

    let envelope = match ServerEnvelope::success(&message) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::error!(message_id = %message.id, error = ?e, "Failed to encode message");
            return;
        }
    };

    let recipients = recipients_for(&message.chat_id, state).await;
    let report = state
        .hub
        .broadcast(&envelope, Some(conn.session_id), &recipients);

    tracing::info!(
        message_id = %message.id,
        chat_id = %message.chat_id,
        delivered = report.delivered,
        dropped = report.dropped.len(),
        "Message sent"
    );
}

/// Reply to the requesting connection with the chat history
async fn handle_get_messages(data: Value, conn: &Arc<Connection>, state: &AppState) {
    let input = match serde_json::from_value::<GetMessagesData>(data) {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!(session_id = %conn.session_id, error = %e, "Invalid get_messages payload");
            reply(conn, ServerEnvelope::error("Invalid input for get_messages"));
            return;
        }
    };

    match state.chat_service.messages_by_chat(&input.chat_id).await {
        Ok(messages) => match ServerEnvelope::success(&messages) {
            Ok(envelope) => reply(conn, envelope),
            Err(e) => tracing::error!(error = ?e, "Failed to encode message history"),
        },
        Err(e) => {
            reply(conn, ServerEnvelope::error(format!("Failed to get messages: {e}")));
        }
    }
}

/// Resolve who receives a message under the configured broadcast scope
async fn recipients_for(chat_id: &str, state: &AppState) -> Recipients {
    match state.config.broadcast_scope {
        BroadcastScope::All => Recipients::All,
        BroadcastScope::Participants => {
            match state.chat_service.participant_user_ids(chat_id).await {
                Ok(user_ids) => Recipients::Users(user_ids.into_iter().collect::<HashSet<_>>()),
                Err(e) => {
                    tracing::error!(chat_id = %chat_id, error = %e, "Failed to resolve chat participants");
                    Recipients::Users(HashSet::new())
                }
            }
        }
    }
}

fn reply(conn: &Connection, envelope: ServerEnvelope) {
    if let Err(e) = conn.send(envelope) {
        tracing::warn!(session_id = %conn.session_id, error = %e, "Failed to queue reply");
    }
}
