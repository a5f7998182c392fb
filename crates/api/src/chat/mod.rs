//! Chat service layer

pub mod service;

pub use service::{ChatError, ChatResult, ChatService};
