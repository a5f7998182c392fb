//! API routes

pub mod chats;
pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth::require_auth, state::AppState, websocket::ws_handler};

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Protected API routes (auth required) - under /api/v1
    let protected_api_routes = Router::new()
        .route("/chats", post(chats::create_chat))
        .route("/chats/with-participants", post(chats::create_chat_with_participants))
        .route("/chats/user", get(chats::list_chats_with_last_message))
        .route("/chats/user/participants", get(chats::list_chats_with_participants))
        .route(
            "/chats/:chat_id/participants",
            get(chats::list_participants).post(chats::add_participant),
        )
        .route("/chats/:chat_id/messages", get(chats::list_messages))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Real-time endpoint; identity is optional and carried in the query string
    let ws_routes = Router::new().route("/ws", get(ws_handler));

    Router::new()
        .merge(health_routes)
        .merge(ws_routes)
        .nest("/api/v1", protected_api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
