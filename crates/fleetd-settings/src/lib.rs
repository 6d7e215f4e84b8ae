//! # fleetd-settings
//!
//! Configuration management with layered sources for the fleetd service.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`Settings::default()`]
//! 2. **Settings file** — `~/.fleetd/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `FLEETD_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{IngestSettings, LoggingSettings, ServerSettings, Settings, StorageSettings};
