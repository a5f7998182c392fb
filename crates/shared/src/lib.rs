//! FamilyFlow shared chat types, storage and database utilities
//!
//! This crate contains the chat domain model and the persistence layer used by
//! the API server.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use db::*;
pub use error::*;
pub use store::{ChatStore, InMemoryChatStore, PgChatStore};
pub use types::*;
