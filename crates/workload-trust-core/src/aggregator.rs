//! Multi-hop trust aggregation
//!
//! The demo request crosses two trust boundaries:
//!
//! 1. **Delegated hop**: frontend → backend, gated by the backend's proxy.
//!    Reaching the backend at all proves the proxy accepted the caller, so
//!    the hop is reported from an [`UpstreamTrust`] token rather than checked.
//! 2. **Direct hop**: backend → downstream resource, which verifies the
//!    backend's client certificate itself. The hop succeeds only if the
//!    [`PayloadSource`] answers.
//!
//! Both outcomes are returned as data. A failed direct hop is a normal result
//! with `success: false`, never an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::TrustError;
use crate::recorder::TrustRecorder;
use crate::types::TrustPattern;

const DELEGATED_HOP_MESSAGE: &str = "Envoy validated frontend SPIFFE ID via SDS";
const DIRECT_HOP_MESSAGE: &str = "PostgreSQL verified backend SPIFFE ID from client certificate";

/// Terminal outcome of one hop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopStatus {
    pub success: bool,
    pub message: String,
    pub pattern: TrustPattern,
}

impl HopStatus {
    pub fn verified(pattern: TrustPattern, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            pattern,
        }
    }

    pub fn failed(pattern: TrustPattern, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            pattern,
        }
    }
}

/// Outcome of the full two-hop flow
///
/// Both hops are always populated. `payload` is empty unless the direct hop
/// succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult<T> {
    #[serde(rename = "frontend_to_backend")]
    pub hop1: HopStatus,

    #[serde(rename = "backend_to_database")]
    pub hop2: HopStatus,

    #[serde(
        rename = "orders",
        default = "Vec::new",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub payload: Vec<T>,

    pub timestamp: DateTime<Utc>,
}

impl<T> AggregateResult<T> {
    /// Whether every hop verified
    pub fn all_verified(&self) -> bool {
        self.hop1.success && self.hop2.success
    }
}

/// Proof that an upstream gatekeeper authenticated the caller
///
/// Handlers behind the proxy mint this for every request they receive; the
/// proxy rejects unauthenticated callers before the handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTrust {
    peer_identity: String,
    message: String,
}

impl UpstreamTrust {
    /// Caller admitted by the proxy under `peer_identity`
    pub fn delegated(peer_identity: impl Into<String>) -> Self {
        Self {
            peer_identity: peer_identity.into(),
            message: DELEGATED_HOP_MESSAGE.to_string(),
        }
    }

    /// Override the description reported for the hop
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn peer_identity(&self) -> &str {
        &self.peer_identity
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Downstream action performed over a mutually authenticated connection
#[async_trait]
pub trait PayloadSource<T>: Send + Sync {
    /// Endpoint dialed, for attempt and failure events
    fn target(&self) -> &str;

    /// Identity the downstream peer presents once verified
    fn peer_identity(&self) -> &str;

    /// Fetch the payload. Any error fails the direct hop.
    async fn fetch_payload(&self) -> Result<Vec<T>, TrustError>;
}

/// Runs the delegated and direct hops and assembles the result
#[derive(Debug, Clone)]
pub struct MultiHopAggregator {
    recorder: TrustRecorder,
    local_identity: String,
    direct_message: String,
}

impl MultiHopAggregator {
    /// `local_identity` is the workload identity of the service running the
    /// flow; it is the source of every recorded event.
    pub fn new(recorder: TrustRecorder, local_identity: impl Into<String>) -> Self {
        Self {
            recorder,
            local_identity: local_identity.into(),
            direct_message: DIRECT_HOP_MESSAGE.to_string(),
        }
    }

    /// Override the description reported for a verified direct hop
    pub fn with_direct_message(mut self, message: impl Into<String>) -> Self {
        self.direct_message = message.into();
        self
    }

    pub fn local_identity(&self) -> &str {
        &self.local_identity
    }

    /// Run both hops in order
    ///
    /// Never fails: a direct-hop error, timeout or cancellation becomes a
    /// failed `hop2`. The source is not polled if `ctx` is already cancelled
    /// or expired.
    pub async fn run_demo_flow<T, S>(
        &self,
        ctx: &RequestContext,
        upstream: &UpstreamTrust,
        source: &S,
    ) -> AggregateResult<T>
    where
        S: PayloadSource<T> + ?Sized,
    {
        let hop1 = self.delegated_hop(upstream);
        let (hop2, payload) = self.direct_hop(ctx, source).await;

        AggregateResult {
            hop1,
            hop2,
            payload,
            timestamp: Utc::now(),
        }
    }

    fn delegated_hop(&self, upstream: &UpstreamTrust) -> HopStatus {
        let pattern = TrustPattern::DelegatedTrust;
        self.recorder.record_success(
            pattern,
            &self.local_identity,
            upstream.peer_identity(),
            "Frontend-to-backend connection validated by upstream proxy",
        );
        HopStatus::verified(pattern, upstream.message())
    }

    async fn direct_hop<T, S>(&self, ctx: &RequestContext, source: &S) -> (HopStatus, Vec<T>)
    where
        S: PayloadSource<T> + ?Sized,
    {
        let pattern = TrustPattern::DirectTrust;
        self.recorder
            .record_attempt(pattern, &self.local_identity, source.target());

        match ctx.run(source.fetch_payload()).await {
            Ok(payload) => {
                self.recorder.record_success_at(
                    pattern,
                    &self.local_identity,
                    source.target(),
                    source.peer_identity(),
                );
                (HopStatus::verified(pattern, self.direct_message.clone()), payload)
            }
            Err(err) => {
                let detail = err.to_string();
                self.recorder
                    .record_failure(pattern, &self.local_identity, source.target(), &detail);
                (
                    HopStatus::failed(
                        pattern,
                        format!("Direct trust verification failed: {}", detail),
                    ),
                    Vec::new(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::MemorySink;
    use crate::types::TrustEventKind;
    use std::sync::Arc;

    struct StaticSource(Result<Vec<u32>, TrustError>);

    #[async_trait]
    impl PayloadSource<u32> for StaticSource {
        fn target(&self) -> &str {
            "db:5432"
        }

        fn peer_identity(&self) -> &str {
            "spiffe://example.org/ns/demo/sa/postgres"
        }

        async fn fetch_payload(&self) -> Result<Vec<u32>, TrustError> {
            self.0.clone()
        }
    }

    fn aggregator() -> (MultiHopAggregator, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let recorder = TrustRecorder::new("backend", sink.clone());
        (
            MultiHopAggregator::new(recorder, "spiffe://example.org/ns/demo/sa/backend"),
            sink,
        )
    }

    fn upstream() -> UpstreamTrust {
        UpstreamTrust::delegated("spiffe://example.org/ns/demo/sa/frontend")
    }

    #[tokio::test]
    async fn test_success_attaches_payload() {
        let (aggregator, _) = aggregator();
        let source = StaticSource(Ok(vec![3, 1, 2]));

        let result = aggregator
            .run_demo_flow(&RequestContext::background(), &upstream(), &source)
            .await;

        assert!(result.all_verified());
        assert_eq!(result.hop1.pattern, TrustPattern::DelegatedTrust);
        assert_eq!(result.hop2.pattern, TrustPattern::DirectTrust);
        assert_eq!(result.payload, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_failure_is_reported_as_data() {
        let (aggregator, sink) = aggregator();
        let source = StaticSource(Err(TrustError::DownstreamRejected("bad certificate".into())));

        let result = aggregator
            .run_demo_flow(&RequestContext::background(), &upstream(), &source)
            .await;

        assert!(result.hop1.success);
        assert!(!result.hop2.success);
        assert!(result.hop2.message.contains("bad certificate"));
        assert!(result.payload.is_empty());

        let failure = sink.events().pop().unwrap();
        assert_eq!(failure.kind, TrustEventKind::Failure);
        assert_eq!(failure.target.as_deref(), Some("db:5432"));
    }

    #[tokio::test]
    async fn test_events_follow_hop_order() {
        let (aggregator, sink) = aggregator();
        let source = StaticSource(Ok(vec![]));

        aggregator
            .run_demo_flow(&RequestContext::background(), &upstream(), &source)
            .await;

        let kinds: Vec<_> = sink.events().iter().map(|e| (e.pattern, e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (TrustPattern::DelegatedTrust, TrustEventKind::Success),
                (TrustPattern::DirectTrust, TrustEventKind::Attempt),
                (TrustPattern::DirectTrust, TrustEventKind::Success),
            ]
        );
    }

    #[test]
    fn test_empty_payload_is_omitted_from_json() {
        let result: AggregateResult<u32> = AggregateResult {
            hop1: HopStatus::verified(TrustPattern::DelegatedTrust, "ok"),
            hop2: HopStatus::failed(TrustPattern::DirectTrust, "down"),
            payload: Vec::new(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("orders").is_none());
        assert_eq!(json["frontend_to_backend"]["pattern"], "envoy-sds");
        assert_eq!(json["backend_to_database"]["success"], false);

        let back: AggregateResult<u32> = serde_json::from_value(json).unwrap();
        assert!(back.payload.is_empty());
    }
}
