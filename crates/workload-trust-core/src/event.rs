//! Trust events
//!
//! A [`TrustEvent`] is the normalized record of one thing that happened on a
//! hop: an attempt to connect, a verified peer, a rejected peer or a rotated
//! credential. Events are built once, handed to a sink and dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{TrustEventKind, TrustPattern};

/// Structured record of a single trust-verification outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustEvent {
    /// Pattern that produced the outcome
    pub pattern: TrustPattern,

    /// What happened
    #[serde(rename = "event")]
    pub kind: TrustEventKind,

    /// Identity of the workload recording the event
    #[serde(rename = "spiffe_id")]
    pub source_identity: String,

    /// Identity the peer presented, once known
    #[serde(rename = "peer_spiffe_id", skip_serializing_if = "Option::is_none")]
    pub target_identity: Option<String>,

    /// Endpoint being dialed (host or URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Human-readable summary
    pub message: String,

    pub timestamp: DateTime<Utc>,
}

impl TrustEvent {
    /// Start building an event for the given pattern and kind
    pub fn builder(pattern: TrustPattern, kind: TrustEventKind) -> TrustEventBuilder {
        TrustEventBuilder::new(pattern, kind)
    }

    /// Default summary for an event kind
    pub fn default_message(kind: TrustEventKind) -> &'static str {
        match kind {
            TrustEventKind::Attempt => "Attempting connection",
            TrustEventKind::Success => "Connection successful",
            TrustEventKind::Failure => "Connection failed",
            TrustEventKind::CredentialRotation => "Credential rotated",
        }
    }
}

/// Builder for [`TrustEvent`]
///
/// The timestamp is taken when [`build`](TrustEventBuilder::build) is called.
#[derive(Debug, Clone)]
pub struct TrustEventBuilder {
    pattern: TrustPattern,
    kind: TrustEventKind,
    source_identity: String,
    target_identity: Option<String>,
    target: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

impl TrustEventBuilder {
    pub fn new(pattern: TrustPattern, kind: TrustEventKind) -> Self {
        Self {
            pattern,
            kind,
            source_identity: String::new(),
            target_identity: None,
            target: None,
            error: None,
            message: None,
        }
    }

    pub fn source_identity(mut self, identity: impl Into<String>) -> Self {
        self.source_identity = identity.into();
        self
    }

    pub fn target_identity(mut self, identity: impl Into<String>) -> Self {
        self.target_identity = Some(identity.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn error(mut self, detail: impl Into<String>) -> Self {
        self.error = Some(detail.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Stamp the event with the current time
    pub fn build(self) -> TrustEvent {
        let message = self
            .message
            .unwrap_or_else(|| TrustEvent::default_message(self.kind).to_string());

        TrustEvent {
            pattern: self.pattern,
            kind: self.kind,
            source_identity: self.source_identity,
            target_identity: self.target_identity,
            target: self.target,
            error: self.error,
            message,
            timestamp: Utc::now(),
        }
    }
}
