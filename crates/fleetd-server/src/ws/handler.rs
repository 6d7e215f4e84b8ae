//! WebSocket upgrade and transport loop for device sessions.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use fleetd_core::StoreError;

use crate::errors::ApiError;
use crate::server::AppState;

use super::session::{DeviceSession, SessionSink};

/// Outbound frames buffered per session before writes start failing.
const SESSION_SEND_BUFFER: usize = 64;

/// GET `/v1/devices/{serial}/events`
///
/// Upgrades to a WebSocket and attaches the device to the event hub. The
/// serial must name a known device; anything else is rejected before the
/// upgrade.
pub async fn device_events(
    State(state): State<AppState>,
    Path(serial): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    match state.store.find_by_serial(&serial) {
        Ok(device) => ws.on_upgrade(move |socket| run_session(socket, device.serial, state)),
        Err(StoreError::NotFound(_)) => ApiError::UnknownDevice.into_response(),
        Err(err) => ApiError::Internal(err.to_string()).into_response(),
    }
}

/// Drive one device session from upgrade through disconnect.
///
/// 1. Registers with the hub (which spawns the forwarding task)
/// 2. Copies outbound frames from the session channel onto the socket
/// 3. Feeds inbound payloads to the hub for the liveness side effect
/// 4. Detaches from the hub when the socket closes or errors
async fn run_session(socket: WebSocket, serial: String, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (send_tx, mut send_rx) = mpsc::channel::<String>(SESSION_SEND_BUFFER);
    let session = Arc::new(DeviceSession::new(serial, send_tx));
    let inbound_tx = state.hub.connect(state.shutdown.token(), session.clone());

    let writer = tokio::spawn(async move {
        while let Some(frame) = send_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => {
                state.hub.message(session.as_ref(), text.as_bytes());
                let _ = inbound_tx.try_send(text.as_bytes().to_vec());
            }
            Message::Binary(data) => {
                state.hub.message(session.as_ref(), &data);
                let _ = inbound_tx.try_send(data.to_vec());
            }
            Message::Close(_) => {
                info!(device = session.device_serial(), "session sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                debug!(device = session.device_serial(), "ws keepalive");
            }
        }
    }

    state.hub.disconnect(session.as_ref());
    writer.abort();
}
