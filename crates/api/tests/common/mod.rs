//! Shared helpers for API integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use familyflow_api::{
    config::{BroadcastScope, Config, LogFormat, StoreBackend},
    create_router, AppState,
};
use familyflow_shared::InMemoryChatStore;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-characters";

pub fn test_config(broadcast_scope: BroadcastScope) -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        log_format: LogFormat::Pretty,
        store_backend: StoreBackend::Memory,
        database_url: None,
        database_max_connections: 1,
        run_migrations: false,
        jwt_secret: JWT_SECRET.to_string(),
        ws_outbound_buffer: 64,
        broadcast_scope,
    }
}

pub fn test_state(broadcast_scope: BroadcastScope) -> AppState {
    AppState::new(test_config(broadcast_scope), Arc::new(InMemoryChatStore::new()))
}

pub fn token_for(state: &AppState, user_id: &str) -> String {
    state.jwt_manager.generate_access_token(user_id).unwrap()
}

/// Serve the router on an ephemeral port
pub async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Poll until the hub holds `expected` connections
pub async fn wait_for_connections(state: &AppState, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.hub.connection_count() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {expected} connections, hub has {}",
            state.hub.connection_count()
        )
    });
}
