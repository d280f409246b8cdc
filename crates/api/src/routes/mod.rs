//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::admin_middleware};

pub mod budgets;
pub mod health;

/// Creates the API router; budget routes see the resolved admin flag.
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let budget_routes =
        budgets::routes().layer(middleware::from_fn_with_state(state, admin_middleware));

    Router::new().merge(health::routes()).merge(budget_routes)
}
