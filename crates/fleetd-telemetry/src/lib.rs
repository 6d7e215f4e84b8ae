//! # fleetd-telemetry
//!
//! Observability plumbing shared across the fleetd crates: tracing
//! subscriber setup and the Prometheus metrics recorder, plus the metric
//! name constants every crate records against.

#![deny(unsafe_code)]

pub mod logging;
pub mod metrics;

pub use logging::{LoggingConfig, init_logging};
pub use self::metrics::install_recorder;
