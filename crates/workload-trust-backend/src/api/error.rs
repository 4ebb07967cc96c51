//! API error types and responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use workload_trust_core::TrustError;

use crate::storage::StorageError;

/// API error type
///
/// Direct-trust failures inside the demo flow are reported in the response
/// body, not through this type.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error")]
    Storage(#[from] StorageError),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UNAVAILABLE",
                msg.clone(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            ApiError::Storage(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                err.to_string(),
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<TrustError> for ApiError {
    fn from(err: TrustError) -> Self {
        match err {
            TrustError::MalformedUpstreamTrust(_) => ApiError::Forbidden(err.to_string()),
            TrustError::DownstreamUnavailable(_)
            | TrustError::DownstreamRejected(_)
            | TrustError::Timeout(_)
            | TrustError::Cancelled => ApiError::Unavailable(err.to_string()),
        }
    }
}
