//! Shared application state

use std::sync::Arc;

use familyflow_shared::ChatStore;

use crate::{auth::JwtManager, chat::ChatService, config::Config, websocket::Hub};

/// Access tokens are issued elsewhere; this only bounds tokens minted locally
const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24;

/// State handed to every axum handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat_service: ChatService,
    pub hub: Hub,
    pub jwt_manager: Arc<JwtManager>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ChatStore>) -> Self {
        let jwt_manager = JwtManager::new(&config.jwt_secret, ACCESS_TOKEN_EXPIRY_HOURS);

        Self {
            config: Arc::new(config),
            chat_service: ChatService::new(store),
            hub: Hub::new(),
            jwt_manager: Arc::new(jwt_manager),
        }
    }
}
