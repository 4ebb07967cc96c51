//! HTTP client for the backend
//!
//! Requests go to the local Envoy sidecar in plain HTTP. The sidecar holds
//! the frontend's SVID and opens the mTLS connection to the backend's proxy,
//! so this client never touches certificates.

use std::time::Duration;
use thiserror::Error;

use workload_trust_core::{AggregateResult, Order};

/// Header carrying the per-request correlation ID
pub const CORRELATION_HEADER: &str = "X-Correlation-ID";

const USER_AGENT: &str = "workload-trust-frontend";

/// Errors calling the backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// No response: refused, reset, timed out
    #[error("Backend connection failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend (or its proxy) answered with a non-200 status
    #[error("Backend error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The body was not a demo result
    #[error("Failed to parse backend response: {0}")]
    Decode(String),
}

/// Client for the backend demo API
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client with a whole-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL of the backend demo endpoint, as reported in trust events
    pub fn demo_url(&self) -> String {
        format!("{}/api/demo", self.base_url)
    }

    /// Run the backend demo flow
    pub async fn fetch_demo(&self, correlation_id: &str) -> Result<AggregateResult<Order>, ClientError> {
        let response = self
            .http
            .get(self.demo_url())
            .header(CORRELATION_HEADER, correlation_id)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(ClientError::Transport)?;

        if status != reqwest::StatusCode::OK {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
