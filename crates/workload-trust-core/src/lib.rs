//! # Workload Trust Core
//!
//! Trust-event recording and multi-hop aggregation for services that
//! authenticate each other with workload identities.
//!
//! ## Trust Patterns
//!
//! 1. **Delegated trust**: an upstream proxy validated the caller before
//!    forwarding the request. The callee trusts the proxy's decision.
//! 2. **Direct trust**: the callee (or its peer) verifies the certificate
//!    presented on the connection itself.
//!
//! ## Components
//!
//! - [`TrustRecorder`]: turns hop outcomes into [`TrustEvent`]s and hands them
//!   to an [`EventSink`]. Recording never fails the caller.
//! - [`MultiHopAggregator`]: runs the delegated hop and the direct hop in
//!   order and folds both outcomes into one [`AggregateResult`].

pub mod aggregator;
pub mod context;
pub mod env;
pub mod error;
pub mod event;
pub mod recorder;
pub mod shutdown;
pub mod telemetry;
pub mod types;

pub use aggregator::{AggregateResult, HopStatus, MultiHopAggregator, PayloadSource, UpstreamTrust};
pub use context::{CancelHandle, RequestContext};
pub use error::{Result, TrustError};
pub use event::{TrustEvent, TrustEventBuilder};
pub use recorder::{EventRecord, EventSink, MemorySink, TracingSink, TrustRecorder};
pub use shutdown::shutdown_signal;
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
pub use types::{Order, OrderStatus, TrustEventKind, TrustPattern};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
