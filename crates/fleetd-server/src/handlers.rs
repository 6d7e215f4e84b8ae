//! HTTP handlers: segment upload and the admin event probe.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use metrics::counter;
use serde::Deserialize;
use tracing::{info, warn};

use fleetd_core::{DeviceEvent, StoreError};
use fleetd_telemetry::metrics::UPLOAD_BYTES_TOTAL;

use crate::errors::ApiError;
use crate::server::AppState;

/// PUT `/v1/devices/{serial}/logs/{segment}`
///
/// Accepts one compressed segment log, persists it under the data
/// directory, and submits it to the ingestion queue. Blocks (and thereby
/// backpressures the device) while the queue is full.
pub async fn upload_log(
    State(state): State<AppState>,
    Path((serial, segment)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    if !is_safe_segment_name(&segment) {
        return Err(ApiError::BadRequest("invalid segment name".into()));
    }
    match state.store.find_by_serial(&serial) {
        Ok(_) => {}
        Err(StoreError::NotFound(_)) => return Err(ApiError::UnknownDevice),
        Err(err) => return Err(ApiError::Internal(err.to_string())),
    }

    let dir = state.data_dir.join(&serial);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let path = dir.join(&segment);
    tokio::fs::write(&path, &body)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    counter!(UPLOAD_BYTES_TOTAL).increment(body.len() as u64);
    info!(
        device = %serial,
        segment = %segment,
        bytes = body.len(),
        "segment uploaded"
    );

    state.queue.add_log(path, serial).await;
    Ok(StatusCode::CREATED)
}

/// Body of the admin test-event probe.
#[derive(Debug, Deserialize)]
pub struct TestEventBody {
    /// Text echoed to whichever session receives the event.
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_message() -> String {
    "ping".into()
}

/// POST `/v1/admin/events/test`
///
/// Publishes a `test` event into the hub's event source. With no live
/// session attached the event is dropped by design, so this returns 202
/// whether or not anything is listening. The body is optional.
pub async fn publish_test_event(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let message = serde_json::from_slice::<TestEventBody>(&body)
        .map_or_else(|_| default_message(), |b| b.message);
    let event = DeviceEvent::Test { message };
    if state.events_tx.send(event).await.is_err() {
        warn!("event source channel closed, probe lost");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::ACCEPTED
}

/// Uploaded segment names become path components; keep them boring.
fn is_safe_segment_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
