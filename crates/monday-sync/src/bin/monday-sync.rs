//! monday.com date sync service binary.
//!
//! Standalone HTTP service receiving monday.com webhooks.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use monday_sync::{config::Config, server};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    info!("Starting monday.com date sync service...");

    // Load configuration
    let config = Config::default();

    if config.api_key_configured() {
        info!("monday.com API key configured");
    } else {
        warn!("MONDAY_API_KEY is not set. Webhooks will be accepted but every sync will fail.");
    }
    if let Some(date) = config.fallback_date {
        warn!(fallback = ?date, "Fallback date enabled for subitems whose parent has no date");
    }

    let port = config.port;
    let state = server::AppState::from_config(config).context("Failed to build API client")?;

    // Build router
    let app = server::build_router(state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port, "monday.com date sync service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("monday.com date sync service stopped");

    Ok(())
}

/// `RUST_LOG` filtering, defaulting to info for this crate. `LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("monday_sync=info".parse()?);
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
