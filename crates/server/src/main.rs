use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use picgrab_core::{
    load_config, validate_config, BrowserImageDownloader, DownloadOrchestrator, HttpPageFetcher,
};
use picgrab_server::{
    api::{create_router, BroadcastReporter, WsBroadcaster},
    runs::RunController,
    state::AppState,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("PICGRAB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("API endpoint: {}", config.download.api_url);
    info!("Download directory: {:?}", config.download.download_dir);
    info!("Browser strategy: {}", config.downloader.strategy.as_str());

    // Listing page fetcher
    let fetcher =
        HttpPageFetcher::new(config.fetcher.clone()).context("Failed to create page fetcher")?;

    // Browser-backed image downloader
    let downloader = BrowserImageDownloader::chromium(config.downloader.clone());

    // Status lines go to the log and to WebSocket clients
    let ws_broadcaster = WsBroadcaster::default();
    let reporter = BroadcastReporter::new(ws_broadcaster.clone());

    let orchestrator = Arc::new(DownloadOrchestrator::new(
        Arc::new(fetcher),
        Arc::new(downloader),
        Arc::new(reporter),
    ));
    let runs = RunController::new(orchestrator, ws_broadcaster.clone());

    let state = Arc::new(AppState::new(config.clone(), runs.clone(), ws_broadcaster));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting picgrab v{} on {}", VERSION, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let an active run close its browser before exiting
    runs.shutdown().await;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
