//! Common types shared by the frontend and backend services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity verification pattern that produced a hop outcome
///
/// Wire names follow the deployment realizing each pattern: an Envoy sidecar
/// fed over SDS for delegated trust, and certificates written by
/// spiffe-helper for direct trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrustPattern {
    /// An upstream proxy authenticated the caller before forwarding
    #[serde(rename = "envoy-sds")]
    DelegatedTrust,
    /// The peer verified the caller's certificate on the connection itself
    #[serde(rename = "spiffe-helper")]
    DirectTrust,
}

impl TrustPattern {
    /// Wire name of the pattern
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustPattern::DelegatedTrust => "envoy-sds",
            TrustPattern::DirectTrust => "spiffe-helper",
        }
    }
}

impl std::fmt::Display for TrustPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrustPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "envoy-sds" | "delegated" | "delegated-trust" => Ok(TrustPattern::DelegatedTrust),
            "spiffe-helper" | "direct" | "direct-trust" => Ok(TrustPattern::DirectTrust),
            _ => Err(format!("Unknown trust pattern: {}", s)),
        }
    }
}

/// What happened during a hop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrustEventKind {
    #[serde(rename = "connection_attempt")]
    Attempt,
    #[serde(rename = "connection_success")]
    Success,
    #[serde(rename = "connection_failure")]
    Failure,
    #[serde(rename = "cert_rotation")]
    CredentialRotation,
}

impl TrustEventKind {
    /// Wire name of the event kind
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustEventKind::Attempt => "connection_attempt",
            TrustEventKind::Success => "connection_success",
            TrustEventKind::Failure => "connection_failure",
            TrustEventKind::CredentialRotation => "cert_rotation",
        }
    }
}

impl std::fmt::Display for TrustEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a demo order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "failed" => Ok(OrderStatus::Failed),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// Demo order row, the payload retrieved over the direct-trust hop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i32,
    pub description: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order
    pub fn new(
        id: i32,
        description: impl Into<String>,
        status: OrderStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            status,
            created_at,
        }
    }
}
