//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`Settings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply `FLEETD_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{Settings, fleetd_dir};

/// Resolve the path to the settings file (`~/.fleetd/settings.json`).
pub fn settings_path() -> PathBuf {
    fleetd_dir().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<Settings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<Settings> {
    let defaults = serde_json::to_value(Settings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: Settings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// `lookup` resolves a variable name to its raw value (the production
/// caller passes `std::env::var`). Each variable has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are silently ignored (fall back to file/default)
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = read_string(&lookup, "FLEETD_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_u16(&lookup, "FLEETD_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = read_usize(&lookup, "FLEETD_MAX_MESSAGE_SIZE", 1024, 1 << 30) {
        settings.server.max_message_size = v;
    }
    if let Some(v) = read_usize(&lookup, "FLEETD_QUEUE_DEPTH", 1, 100_000) {
        settings.ingest.queue_depth = v;
    }
    if let Some(v) = read_string(&lookup, "FLEETD_DATA_DIR") {
        settings.ingest.data_dir = v;
    }
    if let Some(v) = read_string(&lookup, "FLEETD_DB_PATH") {
        settings.storage.db_path = v;
    }
    if let Some(v) = read_u32(&lookup, "FLEETD_POOL_SIZE", 1, 128) {
        settings.storage.pool_size = v;
    }
    if let Some(v) = read_string(&lookup, "FLEETD_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_bool(&lookup, "FLEETD_LOG_JSON") {
        settings.logging.json = v;
    }
}

fn read_string(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.is_empty())
}

fn read_u16(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: u16,
    max: u16,
) -> Option<u16> {
    lookup(name)?
        .parse::<u16>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

fn read_u32(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: u32,
    max: u32,
) -> Option<u32> {
    lookup(name)?
        .parse::<u32>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

fn read_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: usize,
    max: usize,
) -> Option<usize> {
    lookup(name)?
        .parse::<usize>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

fn read_bool(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    match lookup(name)?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
