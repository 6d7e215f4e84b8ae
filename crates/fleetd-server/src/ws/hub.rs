//! The device event hub.
//!
//! Bridges application events into live device sessions. The hub tracks
//! attached sessions, relays each published event through a single shared
//! channel, and drops events outright while nothing is attached — there is
//! no buffering, no retry, and no replay.
//!
//! The shared channel is a **deliver-to-one** relay: with several sessions
//! attached, each event reaches exactly one of them, whichever forwarding
//! task wins the receive. Broadcast would need a per-session fan-out
//! instead; this service's sessions are one-per-device in practice, so the
//! simpler relay is kept and the semantic is documented here.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, gauge};
use parking_lot::RwLock;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fleetd_core::{DeviceEvent, DeviceStore, EventKind};
use fleetd_telemetry::metrics::{
    HUB_EVENTS_DROPPED_TOTAL, HUB_EVENTS_FORWARDED_TOTAL, HUB_EVENTS_PUBLISHED_TOTAL,
    WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};

use super::session::SessionSink;

/// Capacity of the shared relay channel. Sized as a small live-telemetry
/// buffer, not a durable queue.
pub const RELAY_BUFFER: usize = 16;

/// Capacity of each session's inbound payload channel.
const INBOUND_BUFFER: usize = 8;

/// Event kinds forwarded to sessions. Anything else is logged and skipped.
const FORWARDED_KINDS: &[EventKind] = &[EventKind::Test, EventKind::DriveProcessed];

struct SessionHandle {
    cancel: CancellationToken,
}

/// Relays application events to attached device sessions.
pub struct DeviceEventHub {
    store: Arc<dyn DeviceStore>,
    relay_tx: mpsc::Sender<DeviceEvent>,
    relay_rx: Arc<Mutex<mpsc::Receiver<DeviceEvent>>>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl DeviceEventHub {
    /// Create a hub with an empty session set.
    pub fn new(store: Arc<dyn DeviceStore>) -> Self {
        let (relay_tx, relay_rx) = mpsc::channel(RELAY_BUFFER);
        Self {
            store,
            relay_tx,
            relay_rx: Arc::new(Mutex::new(relay_rx)),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of currently attached sessions.
    pub fn connected_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Attach a session and start its forwarding task.
    ///
    /// The task terminates when either `external` (the enclosing session
    /// lifecycle) or the hub-local token armed by [`disconnect`](Self::disconnect)
    /// fires. Returns the sender for inbound payloads; the transport's read
    /// loop feeds it and the task drains it without interpreting anything.
    pub fn connect(
        &self,
        external: CancellationToken,
        session: Arc<dyn SessionSink>,
    ) -> mpsc::Sender<Vec<u8>> {
        counter!(WS_CONNECTIONS_TOTAL).increment(1);
        gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
        info!(
            session = session.id(),
            device = session.device_serial(),
            "device session connected"
        );
        self.touch(session.as_ref());

        let local = CancellationToken::new();
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        // The task is detached; it exits at its next wait point once either
        // token fires.
        let _task = tokio::spawn(forward_events(
            external,
            local.clone(),
            self.relay_rx.clone(),
            inbound_rx,
            session.clone(),
        ));
        let _ = self
            .sessions
            .write()
            .insert(session.id().to_string(), SessionHandle { cancel: local });
        inbound_tx
    }

    /// Record liveness for an inbound payload. The content is ignored.
    pub fn message(&self, session: &dyn SessionSink, payload: &[u8]) {
        self.touch(session);
        debug!(
            session = session.id(),
            device = session.device_serial(),
            len = payload.len(),
            "inbound session payload"
        );
    }

    /// Detach a session and cancel its forwarding task.
    ///
    /// Cancellation is cooperative: the task observes it at its next wait
    /// point and takes no further event off the relay.
    pub fn disconnect(&self, session: &dyn SessionSink) {
        let handle = self.sessions.write().remove(session.id());
        if let Some(handle) = handle {
            handle.cancel.cancel();
            counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
            gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
            info!(
                session = session.id(),
                device = session.device_serial(),
                "device session disconnected"
            );
        }
    }

    /// Publish one application event.
    ///
    /// With no session attached the event is discarded silently. Otherwise
    /// it is handed to the shared relay, where exactly one forwarding task
    /// will consume it.
    pub async fn publish(&self, event: DeviceEvent) {
        if self.connected_count() == 0 {
            counter!(HUB_EVENTS_DROPPED_TOTAL).increment(1);
            debug!(kind = event.kind().as_str(), "no live sessions, dropping event");
            return;
        }
        counter!(HUB_EVENTS_PUBLISHED_TOTAL).increment(1);
        if self.relay_tx.send(event).await.is_err() {
            warn!("relay channel closed, event lost");
        }
    }

    /// Bridge an application event source into the hub.
    ///
    /// Runs until the source channel closes. Events arriving while no
    /// session is attached are dropped by [`publish`](Self::publish).
    pub async fn run(self: Arc<Self>, mut events_rx: mpsc::Receiver<DeviceEvent>) {
        while let Some(event) = events_rx.recv().await {
            self.publish(event).await;
        }
        info!("event source closed, hub relay exiting");
    }

    fn touch(&self, session: &dyn SessionSink) {
        if let Err(err) = self.store.touch_last_ping(session.device_serial()) {
            warn!(
                device = session.device_serial(),
                error = %err,
                "failed to record device liveness"
            );
        }
    }
}

/// Per-session forwarding loop.
///
/// Waits on four sources: the external cancellation, the hub-local
/// cancellation, the shared relay, and the session's inbound payloads
/// (drained, never interpreted). Every failure is log-and-continue; only
/// the affected event is lost.
async fn forward_events(
    external: CancellationToken,
    local: CancellationToken,
    relay: Arc<Mutex<mpsc::Receiver<DeviceEvent>>>,
    mut inbound: mpsc::Receiver<Vec<u8>>,
    session: Arc<dyn SessionSink>,
) {
    let mut inbound_open = true;
    loop {
        tokio::select! {
            // Cancellation wins over a ready event: once either token has
            // fired, no further event is taken off the relay.
            biased;
            () = external.cancelled() => break,
            () = local.cancelled() => break,
            event = next_event(&relay) => {
                let Some(event) = event else { break };
                forward_one(&event, session.as_ref());
            }
            payload = inbound.recv(), if inbound_open => {
                match payload {
                    Some(payload) => debug!(
                        session = session.id(),
                        len = payload.len(),
                        "ignoring inbound payload"
                    ),
                    None => inbound_open = false,
                }
            }
        }
    }
    debug!(session = session.id(), "forwarding task stopped");
}

async fn next_event(relay: &Mutex<mpsc::Receiver<DeviceEvent>>) -> Option<DeviceEvent> {
    relay.lock().await.recv().await
}

fn forward_one(event: &DeviceEvent, session: &dyn SessionSink) {
    let kind = event.kind();
    if !FORWARDED_KINDS.contains(&kind) {
        warn!(kind = kind.as_str(), "unrecognized event kind, skipping");
        return;
    }
    match event.encode() {
        Ok(frame) => match session.write_text(frame) {
            Ok(()) => counter!(HUB_EVENTS_FORWARDED_TOTAL).increment(1),
            Err(err) => warn!(
                session = session.id(),
                kind = kind.as_str(),
                error = %err,
                "failed to write event frame"
            ),
        },
        Err(err) => warn!(kind = kind.as_str(), error = %err, "failed to encode event"),
    }
}
