//! Backend Service
//!
//! The backend sits between two trust hops:
//! - **Delegated trust**: its Envoy sidecar verifies the frontend's SPIFFE ID
//!   over mTLS before any request arrives, so the service trusts the proxy
//! - **Direct trust**: it presents its own X.509 SVID to PostgreSQL, which
//!   verifies the certificate itself
//!
//! ## API Endpoints
//!
//! - `GET /health` - Healthy only while the order store answers
//! - `GET /api/orders` - List orders, newest first
//! - `GET /api/demo` - Run both hops and report each one

pub mod api;
pub mod config;
pub mod rotation;
pub mod storage;

pub use api::create_router;
pub use api::handlers::AppState;
pub use config::{BackendConfig, DbConfig, StoreKind};
pub use rotation::CertWatcher;
#[cfg(feature = "postgres")]
pub use storage::PostgresStore;
pub use storage::{MemoryStore, OrderSource, OrderStore, StorageError};
