//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - Public budget view routes
//! - Admin budget editing routes
//! - The admin token middleware and extractor
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use desa_store::SharedBudgetStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Budget store shared with the snapshot listener.
    pub store: SharedBudgetStore,
    /// Token marking a request as admin; `None` means nobody is admin.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Creates state from a store and the configured admin token.
    #[must_use]
    pub fn new(store: SharedBudgetStore, admin_token: Option<&str>) -> Self {
        Self {
            store,
            admin_token: admin_token.filter(|t| !t.is_empty()).map(Arc::from),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
