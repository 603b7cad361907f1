//! CustomAPI Gateway
//!
//! Single-binary service that:
//! 1. Loads connection settings from `.env`, a TOML file and `CUSTOMAPI_*` env vars
//! 2. Authenticates against the API's OAuth endpoint (or uses a static token)
//! 3. Executes declarative requests posted to `/v1/requests` and returns
//!    the uniform response envelope

mod config;
mod error;
mod metrics;
mod routes;
mod service;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use customapi_auth::{Credentials, TokenManager};
use customapi_client::RequestProxy;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::routes::{AppState, build_router};
use crate::service::{DRAIN_TIMEOUT, ServiceMetrics};

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine; variables already set in the process win
    let dotenv_path = dotenvy::dotenv().ok();

    // JSON output, filter from LOG_LEVEL, then RUST_LOG, then info
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(dotenv = ?dotenv_path, "starting customapi-gateway");

    // Install before anything emits metrics
    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let credentials =
        Credentials::from_settings(&config.api).context("invalid credentials configuration")?;
    info!(
        listen_addr = %config.server.listen_addr,
        base_url = config.api.base_url.as_deref().unwrap_or("<unset>"),
        static_token = credentials.is_static(),
        default_org = config.api.org_id.as_deref().unwrap_or("<none>"),
        timeout_secs = config.server.timeout_secs,
        "configuration loaded"
    );

    // One client for token exchanges and proxied calls
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.server.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let tokens = Arc::new(TokenManager::with_client(credentials, http_client.clone()));
    let proxy = RequestProxy::with_client(tokens, config.api.base_url.clone(), http_client);

    let metrics = ServiceMetrics::new();
    let app_state = AppState {
        proxy: Arc::new(proxy),
        default_org_id: config.api.org_id.clone(),
        metrics: metrics.clone(),
        prometheus: prometheus_handle,
    };
    let app = build_router(app_state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timeout starts when the shutdown signal fires: the server is
    // told to drain, then raced against DRAIN_TIMEOUT.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await?;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => {
            warn!(
                remaining = metrics.in_flight.load(Ordering::Relaxed),
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    info!(
        requests_served = metrics.requests_total.load(Ordering::Relaxed),
        errors_total = metrics.errors_total.load(Ordering::Relaxed),
        "shutdown complete"
    );
    Ok(())
}

/// Wait for SIGTERM or SIGINT.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to install Ctrl+C handler")?;
                info!("received SIGINT, shutting down");
            }
            _ = terminate.recv() => info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("failed to install Ctrl+C handler")?;
        info!("received Ctrl+C, shutting down");
    }

    Ok(())
}
