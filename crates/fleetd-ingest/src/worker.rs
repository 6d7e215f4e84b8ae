//! The single ingestion worker: decode one segment, merge one fix.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use flate2::read::GzDecoder;
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use fleetd_core::{DeviceEvent, DeviceStore, SegmentData};
use fleetd_telemetry::metrics::{INGEST_ERRORS_TOTAL, INGEST_SEGMENTS_TOTAL};

use crate::decode::SegmentDecoder;
use crate::errors::IngestError;
use crate::queue::WorkItem;

/// Consumes the mailbox. Exactly one instance runs per queue.
pub(crate) struct IngestWorker {
    store: Arc<dyn DeviceStore>,
    decoder: Arc<dyn SegmentDecoder>,
    events: Option<mpsc::Sender<DeviceEvent>>,
}

impl IngestWorker {
    pub(crate) fn new(
        store: Arc<dyn DeviceStore>,
        decoder: Arc<dyn SegmentDecoder>,
        events: Option<mpsc::Sender<DeviceEvent>>,
    ) -> Self {
        Self {
            store,
            decoder,
            events,
        }
    }

    /// Drain the mailbox until every sender is gone, strictly in FIFO order.
    pub(crate) async fn run(self, mut rx: mpsc::Receiver<WorkItem>) {
        while let Some(item) = rx.recv().await {
            if let Err(err) = self.process(&item) {
                counter!(
                    INGEST_ERRORS_TOTAL,
                    "device" => item.device_serial.clone(),
                    "stage" => err.stage().as_str()
                )
                .increment(1);
                error!(
                    device = %item.device_serial,
                    path = %item.path.display(),
                    stage = err.stage().as_str(),
                    error = %err,
                    "failed to process segment log"
                );
            }
        }
        info!("ingestion mailbox closed, worker exiting");
    }

    /// Process one uploaded segment. Fails at most once, never retries.
    fn process(&self, item: &WorkItem) -> Result<(), IngestError> {
        let file = File::open(&item.path).map_err(IngestError::OpenFile)?;

        let device = self
            .store
            .find_by_serial(&item.device_serial)
            .map_err(IngestError::FindDevice)?;

        let mut stream = GzDecoder::new(BufReader::new(file));
        let segment = self
            .decoder
            .decode(&mut stream)
            .map_err(IngestError::Decode)?;
        log_segment(&device.serial, &segment);
        counter!(INGEST_SEGMENTS_TOTAL).increment(1);

        if let Some(point) = segment.last_point() {
            if device.accepts_fix(segment.latest_timestamp) {
                self.store
                    .update_last_fix(
                        &device.serial,
                        segment.latest_timestamp,
                        point.lat,
                        point.lng,
                    )
                    .map_err(IngestError::UpdateDevice)?;
            }
        }

        self.notify(&device.serial, &segment);
        Ok(())
    }

    /// Announce a processed segment to the live-session hub, best-effort.
    /// A full or closed event source never fails ingestion.
    fn notify(&self, serial: &str, segment: &SegmentData) {
        let Some(events) = &self.events else { return };
        let event = DeviceEvent::DriveProcessed {
            device: serial.to_string(),
            points: segment.points.len(),
            latest_timestamp: segment.latest_timestamp,
        };
        if events.try_send(event).is_err() {
            debug!(device = serial, "event source unavailable, processed event lost");
        }
    }
}

fn log_segment(serial: &str, segment: &SegmentData) {
    info!(
        device = serial,
        points = segment.points.len(),
        earliest_timestamp = segment.earliest_timestamp,
        latest_timestamp = segment.latest_timestamp,
        car_model = %segment.car_model,
        git_remote = %segment.git_remote,
        git_branch = %segment.git_branch,
        "decoded segment"
    );
}
