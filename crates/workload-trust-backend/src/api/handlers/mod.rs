//! API request handlers

pub mod demo;
pub mod orders;

pub use demo::{run_demo, upstream_trust, FORWARDED_CLIENT_CERT};
pub use orders::{health, list_orders, HealthResponse};

use std::sync::Arc;

use workload_trust_core::{MultiHopAggregator, TrustRecorder};

use crate::config::BackendConfig;
use crate::storage::{OrderSource, OrderStore};

/// Application state shared across handlers
pub struct AppState {
    /// Runs the two-hop demo flow
    pub aggregator: MultiHopAggregator,
    /// Order store wrapped as the direct-trust hop
    pub orders: OrderSource,
    pub config: BackendConfig,
}

impl AppState {
    /// Wire the state from config, a store and a recorder
    pub fn new(config: BackendConfig, store: Arc<dyn OrderStore>, recorder: TrustRecorder) -> Self {
        let aggregator = MultiHopAggregator::new(recorder, config.spiffe_id.clone());
        let orders = OrderSource::new(store, config.db.peer_spiffe_id.clone());
        Self {
            aggregator,
            orders,
            config,
        }
    }
}
