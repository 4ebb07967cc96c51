//! API request handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use workload_trust_core::{AggregateResult, Order, TrustPattern, TrustRecorder};

use super::error::ApiError;
use crate::client::{BackendClient, ClientError};
use crate::config::FrontendConfig;

/// Application state shared across handlers
pub struct AppState {
    pub client: BackendClient,
    pub recorder: TrustRecorder,
    pub config: FrontendConfig,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub component: String,
    pub status: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        component: "frontend".into(),
        status: "healthy".into(),
    })
}

/// Run the demo flow through the backend
///
/// GET /api/demo
///
/// The call leaves through the local proxy, which authenticates the backend
/// by SPIFFE ID. A response therefore means the delegated hop held.
pub async fn run_demo(State(state): State<Arc<AppState>>) -> Result<Json<AggregateResult<Order>>, ApiError> {
    let pattern = TrustPattern::DelegatedTrust;
    let spiffe_id = &state.config.spiffe_id;
    let target = state.client.demo_url();
    let correlation_id = format!("demo-{}", Uuid::new_v4());

    state.recorder.record_attempt(pattern, spiffe_id, &target);

    let result = match state.client.fetch_demo(&correlation_id).await {
        Ok(result) => result,
        Err(err) => {
            match &err {
                ClientError::Transport(_) | ClientError::Status { .. } => {
                    state
                        .recorder
                        .record_failure(pattern, spiffe_id, &target, &err.to_string());
                }
                ClientError::Decode(_) => {
                    error!(
                        error = %err,
                        correlation_id = %correlation_id,
                        "Failed to parse backend response"
                    );
                }
            }
            return Err(err.into());
        }
    };

    state
        .recorder
        .record_success_at(pattern, spiffe_id, &target, &state.config.backend_spiffe_id);

    info!(
        pattern = %pattern,
        correlation_id = %correlation_id,
        orders_count = result.payload.len(),
        "Demo flow completed"
    );

    Ok(Json(result))
}
