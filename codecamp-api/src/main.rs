//! codecamp-api - CodeCamp conference management service
//!
//! Serves camps, talks and speakers over HTTP from a local SQLite database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use codecamp_api::{build_router, seed, AppState};
use codecamp_common::config::{load_config, Overrides, ServiceConfig};
use codecamp_common::db::init::init_database;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "codecamp-api")]
#[command(about = "CodeCamp conference management API")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "CODECAMP_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long, env = "CODECAMP_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "CODECAMP_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CODECAMP_PORT")]
    port: Option<u16>,

    /// Insert sample data into an empty database
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;
    let config = ServiceConfig::resolve(
        Overrides {
            root_folder: args.root_folder,
            host: args.host,
            port: args.port,
            seed_sample_data: args.seed,
        },
        toml_config,
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting CodeCamp API v{}", env!("CARGO_PKG_VERSION"));
    info!("Root folder: {}", config.root_folder.display());
    info!("Database path: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(pool);

    if config.seed_sample_data {
        let mut repo = state.repository();
        seed::seed_sample_data(repo.as_mut())
            .await
            .context("Failed to seed sample data")?;
    }

    let app = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("codecamp-api listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
