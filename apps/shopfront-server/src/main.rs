//! # Shopfront Server Binary
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  env ──► ServerConfig ──► Database (migrations) ──► AppState           │
//! │                                                        │                │
//! │                         session sweeper (hourly) ◄─────┤                │
//! │                                                        ▼                │
//! │                                    axum::serve (graceful shutdown)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Context;
use shopfront_db::{Database, DbConfig};
use shopfront_server::services::payment::PayPalGateway;
use shopfront_server::state::SESSION_IDLE_HOURS;
use shopfront_server::{router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shopfront=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Shopfront server...");

    let config = ServerConfig::load().context("loading configuration")?;
    info!(
        port = config.port,
        db_path = %config.db_path,
        paypal = %config.paypal_api_base,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.db_path).max_connections(config.db_max_connections),
    )
    .await
    .context("opening database")?;
    info!("Database ready");

    if !config.paypal_configured() {
        warn!("PayPal credentials missing, checkout will be unavailable");
    }

    let gateway = Arc::new(PayPalGateway::from_config(&config));
    let addr = config.bind_address();
    let state = AppState::new(db.clone(), gateway, config);

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_idle(chrono::Duration::hours(SESSION_IDLE_HOURS));
            if purged > 0 {
                debug!(purged, remaining = sessions.len(), "Idle sessions purged");
            }
        }
    });

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
