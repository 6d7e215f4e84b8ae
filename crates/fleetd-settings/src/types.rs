//! Settings schema and compiled defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP/WebSocket server settings.
    pub server: ServerSettings,
    /// Log ingestion settings.
    pub ingest: IngestSettings,
    /// SQLite storage settings.
    pub storage: StorageSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// HTTP/WebSocket server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind (0 for auto-assign).
    pub port: u16,
    /// Maximum accepted request body size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8942,
            max_message_size: 32 * 1024 * 1024, // 32 MB
        }
    }
}

/// Log ingestion settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Capacity of the ingestion mailbox; uploads block when it is full.
    pub queue_depth: usize,
    /// Directory where uploaded segment logs are stored.
    pub data_dir: String,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            queue_depth: 100,
            data_dir: fleetd_dir().join("segments").to_string_lossy().into_owned(),
        }
    }
}

/// SQLite storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Maximum connection pool size.
    pub pool_size: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: fleetd_dir().join("fleetd.db").to_string_lossy().into_owned(),
            pool_size: 16,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default log level directive (overridden by `RUST_LOG`).
    pub level: String,
    /// Emit JSON-formatted logs instead of human-readable ones.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

/// The fleetd home directory (`~/.fleetd`).
pub fn fleetd_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".fleetd")
}
