//! Prometheus metrics recorder and the metric names used across crates.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

// Metric name constants to avoid typos across crates.

/// Segment ingestion failures (counter, labels: device, stage).
pub const INGEST_ERRORS_TOTAL: &str = "ingest_errors_total";
/// Segments decoded successfully (counter).
pub const INGEST_SEGMENTS_TOTAL: &str = "ingest_segments_total";
/// Items currently waiting in the ingestion mailbox (gauge).
pub const INGEST_QUEUE_DEPTH: &str = "ingest_queue_depth";
/// Events handed to the relay channel (counter).
pub const HUB_EVENTS_PUBLISHED_TOTAL: &str = "hub_events_published_total";
/// Events dropped because no session was attached (counter).
pub const HUB_EVENTS_DROPPED_TOTAL: &str = "hub_events_dropped_total";
/// Events written to a live session as frames (counter).
pub const HUB_EVENTS_FORWARDED_TOTAL: &str = "hub_events_forwarded_total";
/// Device sessions opened (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// Device sessions closed (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Currently attached device sessions (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Bytes accepted through the upload endpoint (counter).
pub const UPLOAD_BYTES_TOTAL: &str = "upload_bytes_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_render() {
        // Build a recorder + handle (no global install to avoid test conflicts).
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let output = handle.render();
        assert!(output.is_empty() || output.contains('#') || output.contains('\n'));
    }

    #[test]
    fn metric_constants_are_snake_case() {
        let names = [
            INGEST_ERRORS_TOTAL,
            INGEST_SEGMENTS_TOTAL,
            INGEST_QUEUE_DEPTH,
            HUB_EVENTS_PUBLISHED_TOTAL,
            HUB_EVENTS_DROPPED_TOTAL,
            HUB_EVENTS_FORWARDED_TOTAL,
            WS_CONNECTIONS_TOTAL,
            WS_DISCONNECTIONS_TOTAL,
            WS_CONNECTIONS_ACTIVE,
            UPLOAD_BYTES_TOTAL,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
