//! API error types and responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::client::ClientError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend could not be reached
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// The backend answered with an error status, relayed as-is
    #[error("Backend error ({status}): {body}")]
    Backend { status: StatusCode, body: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY", msg),
            ApiError::Backend { status, body } => {
                (status, "BACKEND_ERROR", format!("Backend error: {}", body))
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(_) => ApiError::BadGateway(err.to_string()),
            ClientError::Status { status, body } => match StatusCode::from_u16(status) {
                Ok(status) => ApiError::Backend { status, body },
                Err(_) => ApiError::BadGateway(format!("invalid backend status {}", status)),
            },
            ClientError::Decode(_) => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_status_relayed() {
        let err: ApiError = ClientError::Status {
            status: 503,
            body: "no healthy upstream".into(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_decode_error_is_500() {
        let err: ApiError = ClientError::Decode("expected value".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
