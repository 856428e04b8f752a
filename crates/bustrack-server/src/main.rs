//! # bustrack-server
//!
//! Real-time bus tracking server.
//!
//! This binary provides:
//! - WebSocket endpoint for driver position reports and live viewer updates
//! - Geofence arrival alerts
//! - Read-only REST API with an OpenAPI document
//! - Structured logging to file and stdout
//!
//! ## Running
//!
//! ```bash
//! # Development
//! cargo run --package bustrack-server
//!
//! # Production
//! BUSTRACK_ENV=production ./bustrack-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use bustrack_core::{AppConfig, TrackerError};
use bustrack_server::logging::{self, LogMode};
use bustrack_server::{create_router, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = LogMode::from_env();
    logging::init(mode)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        production = mode.is_production(),
        "Starting bustrack-server"
    );

    let config = AppConfig::load()
        .map_err(TrackerError::from)
        .map_err(|e| startup_error(e, "failed to load configuration"))?;
    info!(
        zones = config.zones.len(),
        routes = config.routes.len(),
        hysteresis_km = config.geofence.hysteresis_km,
        "Configuration loaded"
    );

    let addr = config.bind_address();
    let app = create_router(AppState::new(config));

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(TrackerError::from)
        .map_err(|e| startup_error(e, &format!("failed to bind {addr}")))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Log a fatal startup error with its code and wrap it for the exit path.
fn startup_error(err: TrackerError, context: &str) -> anyhow::Error {
    tracing::error!(code = err.error_code(), error = %err, "{context}");
    anyhow::Error::new(err).context(context.to_string())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                let _ = sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
