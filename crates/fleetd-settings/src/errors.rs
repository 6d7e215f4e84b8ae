//! Error types for settings loading.

use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON, or does not match the schema.
    #[error("invalid settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for settings results.
pub type Result<T> = std::result::Result<T, SettingsError>;
