//! Tracing subscriber initialization.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for log output.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. `"info"` or `"fleetd_ingest=debug"`).
    /// A set `RUST_LOG` env var wins over this.
    pub level: String,
    /// Emit JSON-formatted records instead of human-readable ones.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

/// Initialize the global tracing subscriber. Call once at startup.
pub fn init_logging(config: &LoggingConfig) {
    let filter = build_filter(&config.level);

    if config.json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_filter(filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_filter(filter),
            )
            .init();
    }
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
