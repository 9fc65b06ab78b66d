//! fraudserve
//!
//! Real-time fraud classification over HTTP.
//!
//! Loads the newest trained classifier from the artifact store at startup
//! and scores single transactions or batches posted to `/predict`.

use anyhow::Result;
use clap::Parser;
use fraudserve_server::{
    create_router,
    telemetry::{init_metrics, init_tracing},
    AppState, Cli, ServerConfig,
};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging depends on the config file, so load it before tracing is up
    let config = ServerConfig::load(&cli.config, &cli)?;
    init_tracing(cli.verbose, config.log_format);

    info!("Starting fraudserve {}", env!("CARGO_PKG_VERSION"));
    info!(
        artifact_dir = %config.registry.artifact_dir.display(),
        listen = %config.bind_address(),
        "Configuration loaded"
    );

    let metrics_handle = init_metrics()?;

    let addr: SocketAddr = config.bind_address().parse()?;

    let state = match AppState::load(config, metrics_handle).await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Model could not be loaded; refusing to start");
            return Err(e);
        }
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
}
