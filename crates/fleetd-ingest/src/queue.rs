//! The bounded ingestion mailbox and its lifecycle.

use std::path::PathBuf;
use std::sync::Arc;

use metrics::gauge;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use fleetd_core::{DeviceEvent, DeviceStore};
use fleetd_telemetry::metrics::INGEST_QUEUE_DEPTH;

use crate::decode::SegmentDecoder;
use crate::worker::IngestWorker;

/// Default mailbox capacity. Producers block once this many items wait.
pub const QUEUE_DEPTH: usize = 100;

/// One uploaded segment awaiting ingestion. Consumed exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    /// Path of the uploaded file on local disk.
    pub path: PathBuf,
    /// Serial of the device that uploaded it.
    pub device_serial: String,
}

/// Bounded mailbox feeding the single ingestion worker.
///
/// `stop` must be called at most once, and `add_log` must not be called
/// afterward; late submissions are logged and dropped rather than
/// processed.
pub struct LogQueue {
    tx: Mutex<Option<mpsc::Sender<WorkItem>>>,
    depth: usize,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl LogQueue {
    /// Spawn the worker with the default mailbox capacity.
    pub fn spawn(store: Arc<dyn DeviceStore>, decoder: Arc<dyn SegmentDecoder>) -> Arc<Self> {
        Self::spawn_inner(store, decoder, QUEUE_DEPTH, None)
    }

    /// Spawn the worker with a custom mailbox capacity.
    pub fn spawn_with_depth(
        store: Arc<dyn DeviceStore>,
        decoder: Arc<dyn SegmentDecoder>,
        depth: usize,
    ) -> Arc<Self> {
        Self::spawn_inner(store, decoder, depth, None)
    }

    /// Spawn the worker with an application event source to announce each
    /// processed segment on (best-effort, never blocks ingestion).
    pub fn spawn_with_events(
        store: Arc<dyn DeviceStore>,
        decoder: Arc<dyn SegmentDecoder>,
        depth: usize,
        events: mpsc::Sender<DeviceEvent>,
    ) -> Arc<Self> {
        Self::spawn_inner(store, decoder, depth, Some(events))
    }

    fn spawn_inner(
        store: Arc<dyn DeviceStore>,
        decoder: Arc<dyn SegmentDecoder>,
        depth: usize,
        events: Option<mpsc::Sender<DeviceEvent>>,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(depth);
        let handle = tokio::spawn(IngestWorker::new(store, decoder, events).run(rx));
        Arc::new(Self {
            tx: Mutex::new(Some(tx)),
            depth,
            worker: tokio::sync::Mutex::new(Some(handle)),
        })
    }

    /// Submit one uploaded segment for a device.
    ///
    /// Blocks while the mailbox is full; this backpressure is the only
    /// flow control on the upload path. Enqueue order is preserved and
    /// nothing is deduplicated.
    pub async fn add_log(&self, path: impl Into<PathBuf>, device_serial: impl Into<String>) {
        let item = WorkItem {
            path: path.into(),
            device_serial: device_serial.into(),
        };
        let Some(tx) = self.tx.lock().clone() else {
            warn!(path = %item.path.display(), "queue stopped, dropping log");
            return;
        };
        if tx.send(item).await.is_err() {
            warn!("ingestion worker gone, dropping log");
            return;
        }
        gauge!(INGEST_QUEUE_DEPTH).set(queued(self.depth, &tx));
    }

    /// Stop accepting submissions and block until every already-enqueued
    /// item has been processed. No item is dropped on shutdown.
    pub async fn stop(&self) {
        drop(self.tx.lock().take());
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn queued(depth: usize, tx: &mpsc::Sender<WorkItem>) -> f64 {
    depth.saturating_sub(tx.capacity()) as f64
}
