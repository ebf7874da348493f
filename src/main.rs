//! Predictive Cache server
//!
//! Serves the cache over HTTP with the built-in frequency oracle and an
//! origin-backed fetcher for prefetches.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use predictive_cache::{
    create_router, spawn_sweep_task, AppState, Config, FrequencyOracle, HttpFetcher,
    PredictiveCache,
};

/// Main entry point for the predictive cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the cache with its oracle and fetcher
/// 4. Start the periodic sweep task
/// 5. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "predictive_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Predictive Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_size_bytes={}, max_entries={}, port={}, sweep_interval={}s",
        config.max_size_bytes, config.max_entries, config.server_port, config.sweep_interval_secs
    );

    let cache = PredictiveCache::builder(config.clone())
        .oracle(Arc::new(FrequencyOracle::new()))
        .fetcher(Arc::new(HttpFetcher::new(config.prefetch_origin.clone())))
        .build()
        .context("failed to build cache")?;
    info!(origin = %config.prefetch_origin, "Cache initialized");

    let sweep_handle = spawn_sweep_task(
        cache.store(),
        Duration::from_secs(config.sweep_interval_secs),
    );
    info!("Background sweep task started");

    let app = create_router(AppState::new(cache));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweep task.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    sweep_handle.abort();
    warn!("Sweep task aborted");
}
