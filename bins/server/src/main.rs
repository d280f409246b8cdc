//! Village budget portal API server.
//!
//! Main entry point: loads configuration, opens the document store, keeps
//! the in-memory budget tree in sync with it and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use desa_api::{AppState, create_router};
use desa_shared::AppConfig;
use desa_store::{BudgetStore, document, spawn_listener};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "desa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Open the document store and load every year
    let backend = document::from_config(&config.store)?;
    info!(
        provider = config.store.provider.name(),
        collection = %config.store.collection,
        "Document store configured"
    );
    let mut store = BudgetStore::new(backend);
    store.load().await?;
    let store = Arc::new(Mutex::new(store));

    // Keep the tree in step with remote writes
    let listener_handle = spawn_listener(Arc::clone(&store)).await;

    if config.admin.token.is_none() {
        info!("No admin token configured; budget editing is disabled");
    }
    let state = AppState::new(store, config.admin.token.as_deref());
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    listener_handle.stop();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
