//! # fleetd
//!
//! Vehicle-telemetry server binary — wires together storage, the log
//! ingestion queue, the live event hub, and the HTTP/WebSocket server.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fleetd_core::DeviceStore;
use fleetd_ingest::{JsonLinesDecoder, LogQueue};
use fleetd_server::{DeviceEventHub, FleetServer, ServerConfig, ServiceContext};
use fleetd_settings::Settings;
use fleetd_store::{ConnectionConfig, SqliteDeviceStore};
use fleetd_telemetry::logging::LoggingConfig;

/// Buffer of the application event source feeding the hub. A small live
/// buffer: events are dropped rather than queued when delivery stalls.
const EVENT_SOURCE_BUFFER: usize = 16;

/// fleetd telemetry server.
#[derive(Parser, Debug)]
#[command(name = "fleetd", about = "Vehicle telemetry server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` database (overrides settings).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Directory for uploaded segment logs (overrides settings).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to the settings file.
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn load_settings(args: &Cli) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => fleetd_settings::load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => fleetd_settings::load_settings().unwrap_or_default(),
    };
    if let Some(host) = &args.host {
        settings.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(db_path) = &args.db_path {
        settings.storage.db_path = db_path.to_string_lossy().into_owned();
    }
    if let Some(data_dir) = &args.data_dir {
        settings.ingest.data_dir = data_dir.to_string_lossy().into_owned();
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = load_settings(&args)?;

    fleetd_telemetry::init_logging(&LoggingConfig {
        level: settings.logging.level.clone(),
        json: settings.logging.json,
    });
    let metrics = fleetd_telemetry::install_recorder();

    // Storage
    let db_path = PathBuf::from(&settings.storage.db_path);
    ensure_parent_dir(&db_path)?;
    let pool = fleetd_store::new_file(
        &settings.storage.db_path,
        &ConnectionConfig {
            pool_size: settings.storage.pool_size,
            ..Default::default()
        },
    )
    .context("Failed to open database")?;
    {
        let conn = pool.get().context("Failed to get DB connection")?;
        fleetd_store::run_migrations(&conn).context("Failed to run migrations")?;
    }
    let store: Arc<dyn DeviceStore> = Arc::new(SqliteDeviceStore::new(pool));

    // Live sessions
    let hub = Arc::new(DeviceEventHub::new(store.clone()));
    let (events_tx, events_rx) = tokio::sync::mpsc::channel(EVENT_SOURCE_BUFFER);
    let bridge = tokio::spawn(hub.clone().run(events_rx));

    // Ingestion, announcing processed segments to live sessions
    let data_dir = PathBuf::from(&settings.ingest.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    let queue = LogQueue::spawn_with_events(
        store.clone(),
        Arc::new(JsonLinesDecoder),
        settings.ingest.queue_depth,
        events_tx.clone(),
    );

    // Server
    let config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
        max_message_size: settings.server.max_message_size,
    };
    let ctx = ServiceContext {
        store,
        queue: queue.clone(),
        hub,
        events_tx,
        data_dir,
    };
    let server = FleetServer::new(config, ctx, metrics);

    let (addr, serve_task) = server.listen().await.context("Failed to bind")?;
    info!(%addr, "fleetd is up");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    // Stop accepting traffic, then drain the ingestion mailbox so no
    // uploaded segment is lost.
    server.shutdown().drain(vec![serve_task], None).await;
    queue.stop().await;
    bridge.abort();
    info!("shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_no_overrides() {
        let args = Cli::parse_from(["fleetd"]);
        assert!(args.host.is_none());
        assert!(args.port.is_none());
        assert!(args.db_path.is_none());
    }

    #[test]
    fn cli_overrides_win_over_settings() {
        let args = Cli::parse_from([
            "fleetd",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--db-path",
            "/tmp/x.db",
            "--settings",
            "/nonexistent/fleetd-settings.json",
        ]);
        let settings = load_settings(&args).unwrap();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.storage.db_path, "/tmp/x.db");
    }
}
