//! WebSocket envelope types and serialization
//!
//! Inbound frames are `{"action": string, "data": <json>}`; the action payload
//! is decoded in a second step so an unknown action and a malformed payload
//! produce different error replies. Outbound frames are
//! `{"status": "success"|"error", "message"?: string, "data"?: <json>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Client-to-Server
// =============================================================================

/// Generic inbound envelope
#[derive(Debug, Deserialize)]
pub struct ClientEnvelope {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

pub const ACTION_SEND_MESSAGE: &str = "send_message";
pub const ACTION_GET_MESSAGES: &str = "get_messages";

/// Payload of `send_message`
#[derive(Debug, Deserialize)]
pub struct SendMessageData {
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
}

/// Payload of `get_messages`
#[derive(Debug, Deserialize)]
pub struct GetMessagesData {
    pub chat_id: String,
}

// =============================================================================
// Server-to-Client
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Generic outbound envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEnvelope {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ServerEnvelope {
    pub fn success<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status: Status::Success,
            message: None,
            data: Some(serde_json::to_value(data)?),
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            data: None,
        }
    }
}

pub const ERR_INVALID_FORMAT: &str = "Invalid message format";
pub const ERR_UNKNOWN_ACTION: &str = "Unknown action";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_without_data_decodes() {
        let envelope: ClientEnvelope = serde_json::from_str(r#"{"action":"unknown"}"#).unwrap();
        assert_eq!(envelope.action, "unknown");
        assert!(envelope.data.is_null());
    }

    #[test]
    fn test_send_message_payload_decodes() {
        let envelope: ClientEnvelope = serde_json::from_str(
            r#"{"action":"send_message","data":{"chat_id":"c1","sender_id":"A","content":"hi"}}"#,
        )
        .unwrap();
        let data: SendMessageData = serde_json::from_value(envelope.data).unwrap();

        assert_eq!(data.chat_id, "c1");
        assert_eq!(data.sender_id, "A");
        assert_eq!(data.content, "hi");
    }

    #[test]
    fn test_missing_action_is_rejected() {
        assert!(serde_json::from_str::<ClientEnvelope>(r#"{"data":{}}"#).is_err());
    }

    #[test]
    fn test_error_envelope_serialization() {
        let json = serde_json::to_value(ServerEnvelope::error(ERR_UNKNOWN_ACTION)).unwrap();
        assert_eq!(json, json!({"status": "error", "message": "Unknown action"}));
    }

    #[test]
    fn test_success_envelope_serialization() {
        let envelope = ServerEnvelope::success(&json!({"id": "m1"})).unwrap();
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"status":"success","data":{"id":"m1"}}"#);
    }
}
