//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use familyflow_shared::StoreError;
use serde_json::json;

use crate::chat::ChatError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication errors
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Authentication required")]
    Unauthorized,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Resource errors
    #[error("Resource not found")]
    NotFound,
    #[error("Resource already exists")]
    Conflict(String),

    /// Multi-step creation stopped halfway; `chat_id` exists
    #[error("Chat created but not all participants were added")]
    PartiallyCreated { chat_id: String, added: Vec<String> },

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Authentication
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),

            // Validation
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),

            // Resources
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),

            ApiError::PartiallyCreated { chat_id, added } => {
                let body = Json(json!({
                    "error": {
                        "code": "PARTIALLY_CREATED",
                        "message": self.to_string(),
                        "chat_id": chat_id,
                        "added_participants": added,
                    }
                }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }

            // Internal
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Database error".to_string()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", self.to_string()),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ApiError::Database(msg)
            }
            StoreError::Internal(msg) => {
                tracing::error!(error = %msg, "Store internal error");
                ApiError::Internal
            }
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Store(e) => e.into(),
            ChatError::Incomplete { chat_id, added, .. } => {
                ApiError::PartiallyCreated { chat_id, added }
            }
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status_codes() {
        let cases = [
            (StoreError::NotFound("chat".into()), StatusCode::NOT_FOUND),
            (StoreError::Conflict("dup".into()), StatusCode::CONFLICT),
            (StoreError::Database("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_incomplete_chat_maps_to_partial_error() {
        let err = ChatError::Incomplete {
            chat_id: "c1".to_string(),
            added: vec!["u1".to_string()],
            failed_user_id: "u2".to_string(),
            source: StoreError::Database("boom".to_string()),
        };

        match ApiError::from(err) {
            ApiError::PartiallyCreated { chat_id, added } => {
                assert_eq!(chat_id, "c1");
                assert_eq!(added, vec!["u1".to_string()]);
            }
            other => panic!("expected PartiallyCreated, got {other:?}"),
        }
    }
}
