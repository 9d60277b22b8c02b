//! Licensy server
//!
//! Usage:
//!   licensy-server --config licensy.json
//!   licensy-server --port 8080 --database licensy.db
//!
//! Without a database path the server keeps everything in memory.

use anyhow::{Context, Result};
use clap::Parser;
use licensy_server::{build_router, AppState, ServerConfig};
use licensy_storage::{MemoryRecordStore, RecordStore, SqliteRecordStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "licensy-server")]
#[command(about = "License verification and administration server")]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP port, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database path, overrides the config file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }

    info!("Licensy server starting...");
    let store: Arc<dyn RecordStore> = match &config.database_path {
        Some(path) => {
            info!("Opening database {}", path.display());
            Arc::new(SqliteRecordStore::open(path).context("Failed to open database")?)
        }
        None => {
            warn!("No database configured, licenses and audit entries will not persist");
            Arc::new(MemoryRecordStore::new())
        }
    };

    let state = AppState::new(&config, store).context("Failed to open license stores")?;
    let app = build_router(state);

    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("Licensy server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
