//! FamilyFlow chat API server

use std::sync::Arc;

use anyhow::Context;
use familyflow_api::{
    config::{Config, StoreBackend},
    create_router, telemetry, AppState,
};
use familyflow_shared::{create_pool, run_migrations, ChatStore, InMemoryChatStore, PgChatStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may be set directly
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    telemetry::init_tracing(config.log_format);

    let store: Arc<dyn ChatStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            let pool = create_pool(database_url, config.database_max_connections)
                .await
                .context("Failed to connect to database")?;

            if config.run_migrations {
                run_migrations(&pool)
                    .await
                    .context("Failed to run database migrations")?;
                tracing::info!("Database migrations applied");
            }

            Arc::new(PgChatStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory chat store; data is lost on restart");
            Arc::new(InMemoryChatStore::new())
        }
    };

    let bind_address = config.bind_address.clone();
    let broadcast_scope = config.broadcast_scope;
    let app = create_router(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    tracing::info!(
        address = %bind_address,
        broadcast_scope = ?broadcast_scope,
        "FamilyFlow chat API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
