//! Route definitions for the Kindred HTTP API.
//!
//! All routes are mounted under `/api`.

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::handlers;
use crate::state::AppState;

/// Build the router and thread `state` through every route.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(device_routes())
        .merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Device session registry endpoints
fn device_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/devices",
            post(handlers::devices::register)
                .get(handlers::devices::list)
                .delete(handlers::devices::revoke_all),
        )
        .route(
            "/users/{user_id}/devices/{device_id}",
            delete(handlers::devices::revoke),
        )
        .route(
            "/users/{user_id}/devices/{device_id}/validate",
            post(handlers::devices::validate),
        )
        .route(
            "/users/{user_id}/devices/{device_id}/revoke-others",
            post(handlers::devices::revoke_others),
        )
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
