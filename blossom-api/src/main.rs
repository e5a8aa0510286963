//! blossom-api - JSON REST API for the transcription bots and staff tooling

use anyhow::{Context, Result};
use blossom_api::{build_router, AppState};
use blossom_common::config::{RootFolderInitializer, ServiceConfig, TomlConfig, DEFAULT_API_PORT};
use blossom_common::db::init_database;
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "blossom-api")]
#[command(about = "JSON REST API for Blossom")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "BLOSSOM_API_PORT")]
    port: Option<u16>,

    /// Root folder holding blossom.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = TomlConfig::discover();
    let log_level = toml
        .as_ref()
        .ok()
        .and_then(|t| t.log_level.clone())
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .init();

    info!(
        "Starting Blossom API (blossom-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("BLOSSOM_COMMIT"),
        env!("BLOSSOM_BUILT_AT"),
        env!("BLOSSOM_PROFILE")
    );

    let toml = toml.unwrap_or_else(|e| {
        warn!("Ignoring config file, using defaults: {}", e);
        TomlConfig::default()
    });
    let config = ServiceConfig::resolve(
        args.root_folder.as_deref(),
        args.port,
        &toml,
        |t| t.api_port,
        DEFAULT_API_PORT,
    );

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let app = build_router(AppState::new(pool));

    let addr = config.socket_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("blossom-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
