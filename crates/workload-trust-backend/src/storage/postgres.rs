//! PostgreSQL storage backend
//!
//! Connects with `sslmode=require` and presents the workload's X.509 SVID as
//! the client certificate. PostgreSQL maps the certificate to a role, so a
//! successful connection is the direct-trust hop succeeding.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE orders (
//!     id SERIAL PRIMARY KEY,
//!     description TEXT NOT NULL,
//!     status VARCHAR(32) NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgPool, Row};
use tracing::{error, info};

use workload_trust_core::{Order, TrustPattern, TrustRecorder};

use super::{OrderStore, StorageError};
use crate::config::DbConfig;

/// PostgreSQL order store implementation
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    endpoint: String,
}

impl PostgresStore {
    /// Open the pool and verify the database accepts our certificate
    ///
    /// Records the connection attempt and its outcome as direct-trust events
    /// with `spiffe_id` as the source identity.
    pub async fn connect(
        config: &DbConfig,
        recorder: &TrustRecorder,
        spiffe_id: &str,
    ) -> Result<Self, StorageError> {
        let pattern = TrustPattern::DirectTrust;
        let endpoint = config.endpoint();
        recorder.record_attempt(pattern, spiffe_id, &endpoint);

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.dbname)
            .ssl_mode(PgSslMode::Require)
            .ssl_client_cert(&config.ssl_cert)
            .ssl_client_key(&config.ssl_key)
            .ssl_root_cert(&config.ssl_root_ca);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_open_conns.max(1))
            .min_connections(config.max_idle_conns.min(config.max_open_conns))
            .max_lifetime(config.conn_max_lifetime)
            .connect_with(options)
            .await
            .map_err(|e| {
                let err = classify(e);
                recorder.record_failure(pattern, spiffe_id, &endpoint, &err.to_string());
                err
            })?;

        info!(
            max_open_conns = config.max_open_conns,
            max_idle_conns = config.max_idle_conns,
            conn_max_lifetime = ?config.conn_max_lifetime,
            "Connection pool configured"
        );

        recorder.record_success_at(pattern, spiffe_id, &endpoint, &config.peer_spiffe_id);

        Ok(Self { pool, endpoint })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool, endpoint: impl Into<String>) -> Self {
        Self {
            pool,
            endpoint: endpoint.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, description, status, created_at
            FROM orders
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to query orders");
            classify(e)
        })?;

        let orders = rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            count = orders.len(),
            pattern = %TrustPattern::DirectTrust,
            "Retrieved orders"
        );
        Ok(orders)
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(classify)
    }
}

fn order_from_row(row: &sqlx::postgres::PgRow) -> Result<Order, StorageError> {
    let id: i32 = row.try_get("id").map_err(invalid_row)?;
    let description: String = row.try_get("description").map_err(invalid_row)?;
    let status: String = row.try_get("status").map_err(invalid_row)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(invalid_row)?;

    let status = status.parse().map_err(StorageError::InvalidRow)?;

    Ok(Order {
        id,
        description,
        status,
        created_at,
    })
}

fn invalid_row(err: sqlx::Error) -> StorageError {
    StorageError::InvalidRow(err.to_string())
}

/// Map a sqlx error onto the storage taxonomy
///
/// SQLSTATE class 28 is an authorization failure, which covers a client
/// certificate the server does not map to the requested role.
fn classify(err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(code) if code.starts_with("28") => StorageError::Authentication(err.to_string()),
            _ => StorageError::Database(err.to_string()),
        },
        sqlx::Error::Tls(_) => StorageError::Authentication(err.to_string()),
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StorageError::Connection(err.to_string())
        }
        sqlx::Error::Configuration(_) => StorageError::Connection(err.to_string()),
        _ => StorageError::Database(err.to_string()),
    }
}
