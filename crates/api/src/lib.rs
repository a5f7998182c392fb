//! FamilyFlow chat API library
//!
//! REST chat routes and the real-time chat hub for the FamilyFlow household
//! backend.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod websocket;

pub use chat::{ChatError, ChatService};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
