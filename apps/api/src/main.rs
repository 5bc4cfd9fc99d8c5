//! # Scoop API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        API Server                                       │
//! │                                                                         │
//! │  Counter UI ───► HTTP (8080) ───► Caller check ───► scoop-db ───► SQLite│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scoop_api::{router, ApiConfig, AppState, JwtManager};
use scoop_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,scoop=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    info!("Starting Scoop API server...");

    let config = ApiConfig::load().context("loading configuration")?;
    info!(
        port = config.port,
        database = %config.database_path,
        max_connections = config.max_connections,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("Using the built-in development JWT secret; set SCOOP_JWT_SECRET in production");
    }

    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;
    info!("Database ready, migrations applied");

    let state = AppState::new(
        db.clone(),
        JwtManager::new(&config.jwt_secret, config.token_lifetime_secs),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
