//! Order storage
//!
//! The order table is the resource behind the direct-trust hop. Two
//! backends implement [`OrderStore`]:
//!
//! - [`MemoryStore`]: in-process, for development and tests
//! - `PostgresStore` (feature `postgres`): PostgreSQL reached over TLS with
//!   the workload's client certificate, so the database authenticates the
//!   backend by its SPIFFE identity

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use workload_trust_core::{Order, PayloadSource, TrustError};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The database could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The database refused our credential
    #[error("Authentication rejected: {0}")]
    Authentication(String),

    #[error("Database error: {0}")]
    Database(String),

    /// A row could not be mapped to an [`Order`]
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl From<StorageError> for TrustError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Authentication(_) => TrustError::DownstreamRejected(err.to_string()),
            StorageError::Connection(_)
            | StorageError::Database(_)
            | StorageError::InvalidRow(_) => TrustError::DownstreamUnavailable(err.to_string()),
        }
    }
}

/// Storage backend for orders
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait OrderStore: Send + Sync + Debug {
    /// Where the store lives, for trust events (`host:port`, `memory`)
    fn endpoint(&self) -> &str;

    /// All orders, newest first
    async fn list_orders(&self) -> Result<Vec<Order>, StorageError>;

    /// Verify the store is reachable
    async fn health_check(&self) -> Result<(), StorageError>;
}

/// The order store seen as the direct-trust hop's downstream action
#[derive(Debug, Clone)]
pub struct OrderSource {
    store: Arc<dyn OrderStore>,
    peer_identity: String,
}

impl OrderSource {
    /// `peer_identity` is the SPIFFE ID the database presents
    pub fn new(store: Arc<dyn OrderStore>, peer_identity: impl Into<String>) -> Self {
        Self {
            store,
            peer_identity: peer_identity.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }
}

#[async_trait]
impl PayloadSource<Order> for OrderSource {
    fn target(&self) -> &str {
        self.store.endpoint()
    }

    fn peer_identity(&self) -> &str {
        &self.peer_identity
    }

    async fn fetch_payload(&self) -> Result<Vec<Order>, TrustError> {
        Ok(self.store.list_orders().await?)
    }
}
