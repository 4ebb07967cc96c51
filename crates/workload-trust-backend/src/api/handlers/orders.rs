//! Order and health handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use workload_trust_core::{Order, TrustError};

use super::AppState;
use crate::api::error::ApiError;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub component: String,
}

/// Health check endpoint, healthy only while the order store answers
///
/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    if let Err(e) = state.orders.store().health_check().await {
        error!(error = %e, "Health check failed");
        return Err(TrustError::from(e).into());
    }

    Ok(Json(HealthResponse {
        status: "healthy".into(),
        component: "backend".into(),
    }))
}

/// List all orders
///
/// GET /api/orders
pub async fn list_orders(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state.orders.store().list_orders().await.map_err(|e| {
        error!(error = %e, "Failed to retrieve orders");
        e
    })?;

    Ok(Json(orders))
}
