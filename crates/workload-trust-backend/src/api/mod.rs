//! API module for the backend service

pub mod error;
pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use handlers::AppState;

/// Create the API router
///
/// Requests still running after `request_timeout` get a 408.
pub fn create_router(state: Arc<AppState>) -> Router {
    let request_timeout = state.config.request_timeout;

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health))
        // Order endpoints
        .route("/api/orders", get(handlers::list_orders))
        // Two-hop trust demo
        .route("/api/demo", get(handlers::run_demo))
        // Middleware
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
