//! Backend Service Binary
//!
//! Connects to the order store, then serves the demo API until SIGINT or
//! SIGTERM.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use workload_trust_backend::{
    create_router, AppState, BackendConfig, CertWatcher, MemoryStore, OrderStore, StoreKind,
};
use workload_trust_core::env::ProcessEnv;
use workload_trust_core::{init_tracing, shutdown_signal, TrustRecorder};

/// How long in-flight requests get once shutdown starts
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BackendConfig::from_lookup(&ProcessEnv);

    init_tracing(&config.telemetry).context("Failed to set tracing subscriber")?;

    info!(version = workload_trust_core::VERSION, "Starting backend service");
    info!(
        host = %config.db.host,
        port = config.db.port,
        dbname = %config.db.dbname,
        max_open_conns = config.db.max_open_conns,
        max_idle_conns = config.db.max_idle_conns,
        conn_max_lifetime = ?config.db.conn_max_lifetime,
        ssl_cert = %config.db.ssl_cert,
        ssl_key = %config.db.ssl_key,
        ssl_root_ca = %config.db.ssl_root_ca,
        "Database configuration loaded"
    );

    let recorder = TrustRecorder::tracing("backend");
    let store = open_store(&config, &recorder).await?;

    let (drain_tx, mut drain_rx) = watch::channel(false);

    if config.store == StoreKind::Postgres && !config.cert_watch_interval.is_zero() {
        let watcher = CertWatcher::new(
            &config.db.ssl_cert,
            config.cert_watch_interval,
            recorder.clone(),
            config.spiffe_id.clone(),
        );
        tokio::spawn(watcher.run(drain_rx.clone()));
    }

    let port = config.port;
    let state = Arc::new(AppState::new(config, store, recorder));
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        addr = %addr,
        endpoints = ?["/health", "/api/orders", "/api/demo"],
        "Backend HTTP server listening"
    );

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = drain_tx.send(true);
            })
            .await
    });

    tokio::select! {
        res = &mut server => {
            res?.context("Server error")?;
        }
        _ = drain_rx.changed() => {
            match tokio::time::timeout(DRAIN_TIMEOUT, &mut server).await {
                Ok(res) => res?.context("Server error during shutdown")?,
                Err(_) => {
                    warn!(timeout = ?DRAIN_TIMEOUT, "Graceful shutdown timed out, closing connections");
                    server.abort();
                }
            }
        }
    }

    info!("Backend service stopped gracefully");
    Ok(())
}

async fn open_store(config: &BackendConfig, recorder: &TrustRecorder) -> anyhow::Result<Arc<dyn OrderStore>> {
    match config.store {
        StoreKind::Memory => {
            info!("Using in-memory order store");
            Ok(Arc::new(MemoryStore::seeded()))
        }
        #[cfg(feature = "postgres")]
        StoreKind::Postgres => {
            let store = workload_trust_backend::PostgresStore::connect(&config.db, recorder, &config.spiffe_id)
                .await
                .context("Failed to connect to database")?;
            info!(
                pattern = %workload_trust_core::TrustPattern::DirectTrust,
                "Database connection established"
            );
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StoreKind::Postgres => {
            let _ = recorder;
            anyhow::bail!("ORDER_STORE=postgres requires the `postgres` feature")
        }
    }
}
