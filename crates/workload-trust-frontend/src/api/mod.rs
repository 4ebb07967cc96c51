//! API module for the frontend service

pub mod error;
pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use handlers::AppState;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_path = state.config.static_path.clone();
    let request_timeout = state.config.request_timeout;

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health))
        // Demo proxy
        .route("/api/demo", get(handlers::run_demo))
        // UI
        .route_service("/", ServeFile::new(static_path.join("index.html")))
        .nest_service("/static", ServeDir::new(static_path))
        // Middleware
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
