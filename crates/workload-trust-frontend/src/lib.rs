//! Frontend Service
//!
//! Serves the demo UI and relays demo requests to the backend through the
//! local Envoy sidecar. The sidecar authenticates the backend with mTLS
//! (delegated trust); this service only records the outcome.
//!
//! ## API Endpoints
//!
//! - `GET /` - Demo UI
//! - `GET /static/*` - UI assets
//! - `GET /api/demo` - Run the demo flow through the backend
//! - `GET /health` - Liveness check

pub mod api;
pub mod client;
pub mod config;

pub use api::create_router;
pub use api::handlers::AppState;
pub use client::{BackendClient, ClientError};
pub use config::FrontendConfig;
