//! Error types for the storage subsystem.

use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// No device row exists for the given serial.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// A nanosecond timestamp does not fit the storage column.
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(u64),
}

/// Convenience alias for repository results.
pub type Result<T> = std::result::Result<T, RepoError>;
