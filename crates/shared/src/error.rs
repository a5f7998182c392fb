//! Storage error types

use thiserror::Error;

/// Error returned by every chat store operation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // PostgreSQL unique violation
                Some("23505") => StoreError::Conflict(db_err.message().to_string()),
                // PostgreSQL foreign key violation (referenced chat is missing)
                Some("23503") => StoreError::NotFound(db_err.message().to_string()),
                _ => StoreError::Database(db_err.to_string()),
            },
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
