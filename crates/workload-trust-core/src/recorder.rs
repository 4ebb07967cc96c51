//! Trust event recording
//!
//! The [`TrustRecorder`] is the only place trust events are created. It keeps
//! the services' control flow free of logging and guarantees every hop,
//! whichever pattern produced it, lands in the log with the same shape.

use serde_json::{Map, Value};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::event::TrustEvent;
use crate::types::{TrustEventKind, TrustPattern};

/// A trust event tagged with the component that recorded it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub component: String,
    pub event: TrustEvent,
}

impl EventRecord {
    /// Flatten the record into a field mapping
    ///
    /// Keys match the fields `TracingSink` logs, so `target` becomes `endpoint`.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = match serde_json::to_value(&self.event) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Some(target) = fields.remove("target") {
            fields.insert("endpoint".into(), target);
        }
        fields.insert("component".into(), Value::String(self.component.clone()));
        fields
    }
}

/// Append-only destination for trust events
///
/// Implementations are shared by concurrent requests and must not fail or
/// block the caller. Ordering across requests is not guaranteed.
pub trait EventSink: Send + Sync + Debug {
    fn emit(&self, record: &EventRecord);
}

/// Sink that writes each event as one structured `tracing` line
///
/// Failures log at ERROR, everything else at INFO.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, record: &EventRecord) {
        let event = &record.event;
        match event.kind {
            TrustEventKind::Failure => error!(
                component = %record.component,
                pattern = %event.pattern,
                event = %event.kind,
                spiffe_id = %event.source_identity,
                peer_spiffe_id = event.target_identity.as_deref(),
                endpoint = event.target.as_deref(),
                error = event.error.as_deref(),
                "{}",
                event.message
            ),
            TrustEventKind::Attempt | TrustEventKind::Success | TrustEventKind::CredentialRotation => {
                info!(
                    component = %record.component,
                    pattern = %event.pattern,
                    event = %event.kind,
                    spiffe_id = %event.source_identity,
                    peer_spiffe_id = event.target_identity.as_deref(),
                    endpoint = event.target.as_deref(),
                    "{}",
                    event.message
                )
            }
        }
    }
}

/// Sink that keeps events in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<EventRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything emitted so far
    pub fn records(&self) -> Vec<EventRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Just the events, without component tags
    pub fn events(&self) -> Vec<TrustEvent> {
        self.records().into_iter().map(|r| r.event).collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn emit(&self, record: &EventRecord) {
        // A poisoned lock still holds a usable Vec; recording must not panic.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
    }
}

/// Records trust events for one component
///
/// Every method is fire-and-forget.
#[derive(Debug, Clone)]
pub struct TrustRecorder {
    component: String,
    sink: Arc<dyn EventSink>,
}

impl TrustRecorder {
    /// Create a recorder writing to the given sink
    pub fn new(component: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            component: component.into(),
            sink,
        }
    }

    /// Create a recorder writing to `tracing`
    pub fn tracing(component: impl Into<String>) -> Self {
        Self::new(component, Arc::new(TracingSink))
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Record a connection attempt against `target`
    pub fn record_attempt(&self, pattern: TrustPattern, source_identity: &str, target: &str) {
        self.record(
            TrustEvent::builder(pattern, TrustEventKind::Attempt)
                .source_identity(source_identity)
                .target(target)
                .build(),
        );
    }

    /// Record a verified peer
    pub fn record_success(
        &self,
        pattern: TrustPattern,
        source_identity: &str,
        target_identity: &str,
        message: &str,
    ) {
        self.record(
            TrustEvent::builder(pattern, TrustEventKind::Success)
                .source_identity(source_identity)
                .target_identity(target_identity)
                .message(message)
                .build(),
        );
    }

    /// Record a verified peer reached at a known endpoint
    pub fn record_success_at(
        &self,
        pattern: TrustPattern,
        source_identity: &str,
        target: &str,
        target_identity: &str,
    ) {
        self.record(
            TrustEvent::builder(pattern, TrustEventKind::Success)
                .source_identity(source_identity)
                .target(target)
                .target_identity(target_identity)
                .build(),
        );
    }

    /// Record a failed hop
    pub fn record_failure(
        &self,
        pattern: TrustPattern,
        source_identity: &str,
        target: &str,
        error_detail: &str,
    ) {
        self.record(
            TrustEvent::builder(pattern, TrustEventKind::Failure)
                .source_identity(source_identity)
                .target(target)
                .error(error_detail)
                .build(),
        );
    }

    /// Record that the workload picked up a rotated credential
    pub fn record_rotation(&self, pattern: TrustPattern, source_identity: &str, message: &str) {
        self.record(
            TrustEvent::builder(pattern, TrustEventKind::CredentialRotation)
                .source_identity(source_identity)
                .message(message)
                .build(),
        );
    }

    /// Forward a pre-built event
    pub fn record(&self, event: TrustEvent) {
        self.sink.emit(&EventRecord {
            component: self.component.clone(),
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKEND: &str = "spiffe://example.org/ns/demo/sa/backend";
    const POSTGRES: &str = "spiffe://example.org/ns/demo/sa/postgres";

    fn recorder() -> (TrustRecorder, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (TrustRecorder::new("backend", sink.clone()), sink)
    }

    #[test]
    fn test_attempt_has_no_peer_identity() {
        let (recorder, sink) = recorder();
        recorder.record_attempt(TrustPattern::DirectTrust, BACKEND, "postgres:5432");

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TrustEventKind::Attempt);
        assert_eq!(events[0].target.as_deref(), Some("postgres:5432"));
        assert!(events[0].target_identity.is_none());
    }

    #[test]
    fn test_failure_carries_error_detail() {
        let (recorder, sink) = recorder();
        recorder.record_failure(TrustPattern::DirectTrust, BACKEND, "postgres:5432", "dial refused");

        let event = &sink.events()[0];
        assert_eq!(event.kind, TrustEventKind::Failure);
        assert_eq!(event.error.as_deref(), Some("dial refused"));
        assert!(event.target_identity.is_none());
    }

    #[test]
    fn test_success_at_records_endpoint_and_peer() {
        let (recorder, sink) = recorder();
        recorder.record_success_at(TrustPattern::DirectTrust, BACKEND, "postgres:5432", POSTGRES);

        let event = &sink.events()[0];
        assert_eq!(event.target_identity.as_deref(), Some(POSTGRES));
        assert_eq!(event.message, "Connection successful");
    }

    #[test]
    fn test_record_fields_include_component() {
        let (recorder, sink) = recorder();
        recorder.record_success(TrustPattern::DirectTrust, BACKEND, POSTGRES, "verified");

        let fields = sink.records()[0].fields();
        assert_eq!(fields["component"], "backend");
        assert_eq!(fields["pattern"], "spiffe-helper");
        assert_eq!(fields["event"], "connection_success");
        assert_eq!(fields["peer_spiffe_id"], POSTGRES);
        assert_eq!(fields["message"], "verified");
        assert!(!fields.contains_key("endpoint"));
    }

    #[test]
    fn test_record_fields_name_endpoint_like_tracing_sink() {
        let (recorder, sink) = recorder();
        recorder.record_success_at(TrustPattern::DirectTrust, BACKEND, "postgres:5432", POSTGRES);

        let fields = sink.records()[0].fields();
        assert_eq!(fields["endpoint"], "postgres:5432");
        assert!(!fields.contains_key("target"));
    }

    #[test]
    fn test_rotation_event() {
        let (recorder, sink) = recorder();
        recorder.record_rotation(TrustPattern::DirectTrust, BACKEND, "SVID renewed");

        let event = &sink.events()[0];
        assert_eq!(event.kind, TrustEventKind::CredentialRotation);
        assert_eq!(event.message, "SVID renewed");
    }

    #[test]
    fn test_tracing_sink_accepts_every_kind() {
        let recorder = TrustRecorder::tracing("backend");
        recorder.record_attempt(TrustPattern::DirectTrust, BACKEND, "postgres:5432");
        recorder.record_success(TrustPattern::DirectTrust, BACKEND, POSTGRES, "ok");
        recorder.record_failure(TrustPattern::DirectTrust, BACKEND, "postgres:5432", "boom");
        recorder.record_rotation(TrustPattern::DirectTrust, BACKEND, "rotated");
        assert_eq!(recorder.component(), "backend");
    }
}
