//! WebSocket support for real-time chat
//!
//! Clients connect to `/ws` and exchange JSON envelopes. A message created over
//! the socket is persisted first, then fanned out to the other connections.
//!
//! # Architecture
//!
//! - **Connection**: one open socket with a bounded outbound queue
//! - **Hub**: registry of open connections, performs fan-out
//! - **Handler**: Axum route handler and per-connection read loop
//! - **Events**: inbound/outbound envelope definitions

pub mod connection;
pub mod events;
pub mod handler;
pub mod hub;

pub use connection::{Connection, DeliveryError};
pub use handler::ws_handler;
pub use hub::{BroadcastReport, Hub, HubStats, Recipients};
