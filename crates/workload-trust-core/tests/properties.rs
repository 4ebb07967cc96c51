//! Property-Based Tests for the Multi-Hop Aggregator
//!
//! Checks the aggregate contract over arbitrary downstream behavior:
//! - Payload order is preserved exactly on success
//! - Failures always carry their detail and drop the payload
//! - Repeated runs against the same source agree
//! - The delegated hop is always reported first

use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::Arc;

use workload_trust_core::{
    MemorySink, MultiHopAggregator, PayloadSource, RequestContext, TrustError, TrustEventKind,
    TrustPattern, TrustRecorder, UpstreamTrust,
};

struct ScriptedSource {
    outcome: Result<Vec<String>, TrustError>,
}

#[async_trait]
impl PayloadSource<String> for ScriptedSource {
    fn target(&self) -> &str {
        "postgres.demo.svc.cluster.local:5432"
    }

    fn peer_identity(&self) -> &str {
        "spiffe://example.org/ns/demo/sa/postgres"
    }

    async fn fetch_payload(&self) -> Result<Vec<String>, TrustError> {
        self.outcome.clone()
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
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

fn arb_error() -> impl Strategy<Value = TrustError> {
    "[a-z ]{1,24}".prop_flat_map(|detail| {
        prop_oneof![
            Just(TrustError::DownstreamUnavailable(detail.clone())),
            Just(TrustError::DownstreamRejected(detail.clone())),
            Just(TrustError::Timeout(detail)),
        ]
    })
}

proptest! {
    /// Successful hop 2 returns the payload unchanged and in order
    #[test]
    fn prop_payload_preserved(records in prop::collection::vec("[a-z0-9]{0,12}", 0..20)) {
        let (aggregator, _) = aggregator();
        let source = ScriptedSource { outcome: Ok(records.clone()) };

        let result = runtime().block_on(
            aggregator.run_demo_flow(&RequestContext::background(), &upstream(), &source),
        );

        prop_assert!(result.hop1.success);
        prop_assert!(result.hop2.success);
        prop_assert_eq!(result.payload, records);
    }

    /// Failing hop 2 keeps hop 1, reports the detail, drops the payload
    #[test]
    fn prop_failure_reported(err in arb_error()) {
        let (aggregator, sink) = aggregator();
        let detail = err.to_string();
        let source = ScriptedSource { outcome: Err(err) };

        let result = runtime().block_on(
            aggregator.run_demo_flow(&RequestContext::background(), &upstream(), &source),
        );

        prop_assert!(result.hop1.success);
        prop_assert!(!result.hop2.success);
        prop_assert!(result.hop2.message.contains(&detail));
        prop_assert!(result.payload.is_empty());

        let last = sink.events().pop().expect("failure event");
        prop_assert_eq!(last.kind, TrustEventKind::Failure);
        prop_assert_eq!(last.error, Some(detail));
    }

    /// Two runs against an unchanged source agree on everything but time
    #[test]
    fn prop_idempotent(records in prop::collection::vec("[a-z]{1,8}", 0..8), fail in any::<bool>()) {
        let (aggregator, _) = aggregator();
        let outcome = if fail {
            Err(TrustError::DownstreamUnavailable("dial refused".into()))
        } else {
            Ok(records)
        };
        let source = ScriptedSource { outcome };
        let rt = runtime();

        let first = rt.block_on(
            aggregator.run_demo_flow(&RequestContext::background(), &upstream(), &source),
        );
        let second = rt.block_on(
            aggregator.run_demo_flow(&RequestContext::background(), &upstream(), &source),
        );

        prop_assert_eq!(first.hop1, second.hop1);
        prop_assert_eq!(first.hop2, second.hop2);
        prop_assert_eq!(first.payload, second.payload);
    }

    /// The delegated hop event always precedes every direct hop event
    #[test]
    fn prop_hop_order(fail in any::<bool>()) {
        let (aggregator, sink) = aggregator();
        let outcome = if fail {
            Err(TrustError::DownstreamRejected("certificate unknown".into()))
        } else {
            Ok(vec!["a".to_string()])
        };
        let source = ScriptedSource { outcome };

        runtime().block_on(
            aggregator.run_demo_flow(&RequestContext::background(), &upstream(), &source),
        );

        let events = sink.events();
        prop_assert_eq!(events.len(), 3);
        prop_assert_eq!(events[0].pattern, TrustPattern::DelegatedTrust);
        prop_assert!(events[1..].iter().all(|e| e.pattern == TrustPattern::DirectTrust));
    }
}
