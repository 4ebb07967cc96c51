//! Frontend Service Binary

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use workload_trust_core::env::ProcessEnv;
use workload_trust_core::{init_tracing, shutdown_signal, TrustRecorder};
use workload_trust_frontend::{create_router, AppState, BackendClient, FrontendConfig};

/// How long in-flight requests get once shutdown starts
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = FrontendConfig::from_lookup(&ProcessEnv);

    init_tracing(&config.telemetry).context("Failed to set tracing subscriber")?;

    info!(
        version = workload_trust_core::VERSION,
        backend_url = %config.backend_url,
        static_path = %config.static_path.display(),
        "Starting frontend service"
    );

    let client = BackendClient::new(config.backend_url.clone(), config.backend_timeout)
        .context("Failed to build backend client")?;

    let port = config.port;
    let state = Arc::new(AppState {
        client,
        recorder: TrustRecorder::tracing("frontend"),
        config,
    });
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        addr = %addr,
        endpoints = ?["/", "/static/*", "/api/demo", "/health"],
        "Frontend HTTP server listening"
    );

    let (drain_tx, mut drain_rx) = watch::channel(false);
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

    info!("Frontend service stopped gracefully");
    Ok(())
}
