//! In-crate fakes and fixtures for ingestion tests.

use std::collections::HashMap;
use std::io::Read;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;
use parking_lot::Mutex;

use fleetd_core::{Device, DeviceStore, SegmentData, StoreError};

use crate::decode::{DecodeError, SegmentDecoder};

/// In-memory device store that records the order of operations and can be
/// told to fail lookups or updates.
pub(crate) struct MemoryStore {
    devices: Mutex<HashMap<String, Device>>,
    pub(crate) ops: Mutex<Vec<String>>,
    pub(crate) fail_find: AtomicBool,
    pub(crate) fail_update: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            ops: Mutex::new(Vec::new()),
            fail_find: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
        }
    }

    pub(crate) fn insert(&self, serial: &str) {
        let device = Device::new(serial, "2026-01-01T00:00:00Z");
        let _ = self.devices.lock().insert(serial.to_string(), device);
    }

    pub(crate) fn insert_with_fix(&self, serial: &str, timestamp: u64, lat: f64, lng: f64) {
        let mut device = Device::new(serial, "2026-01-01T00:00:00Z");
        device.last_fix_time = Some(timestamp);
        device.last_fix_lat = Some(lat);
        device.last_fix_lng = Some(lng);
        let _ = self.devices.lock().insert(serial.to_string(), device);
    }

    pub(crate) fn get(&self, serial: &str) -> Option<Device> {
        self.devices.lock().get(serial).cloned()
    }

    pub(crate) fn op_log(&self) -> Vec<String> {
        self.ops.lock().clone()
    }
}

impl DeviceStore for MemoryStore {
    fn find_by_serial(&self, serial: &str) -> Result<Device, StoreError> {
        self.ops.lock().push(format!("find:{serial}"));
        if self.fail_find.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("injected".into()));
        }
        self.devices
            .lock()
            .get(serial)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(serial.to_string()))
    }

    fn update_last_fix(
        &self,
        serial: &str,
        timestamp: u64,
        lat: f64,
        lng: f64,
    ) -> Result<(), StoreError> {
        self.ops.lock().push(format!("update:{serial}"));
        if self.fail_update.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("injected".into()));
        }
        let mut devices = self.devices.lock();
        let device = devices
            .get_mut(serial)
            .ok_or_else(|| StoreError::NotFound(serial.to_string()))?;
        device.last_fix_time = Some(timestamp);
        device.last_fix_lat = Some(lat);
        device.last_fix_lng = Some(lng);
        Ok(())
    }

    fn touch_last_ping(&self, serial: &str) -> Result<(), StoreError> {
        self.ops.lock().push(format!("ping:{serial}"));
        Ok(())
    }
}

/// Decoder that returns a fixed segment without reading the stream.
pub(crate) struct FixedDecoder(pub(crate) SegmentData);

impl SegmentDecoder for FixedDecoder {
    fn decode(&self, _reader: &mut dyn Read) -> Result<SegmentData, DecodeError> {
        Ok(self.0.clone())
    }
}

/// Decoder that blocks until released through a channel, used to hold the
/// worker mid-item so mailbox backpressure can be observed.
pub(crate) struct GateDecoder {
    pub(crate) gate: Mutex<std::sync::mpsc::Receiver<()>>,
    pub(crate) segment: SegmentData,
}

impl SegmentDecoder for GateDecoder {
    fn decode(&self, _reader: &mut dyn Read) -> Result<SegmentData, DecodeError> {
        let _ = self.gate.lock().recv();
        Ok(self.segment.clone())
    }
}

/// Write a gzip-compressed segment file and return its path.
pub(crate) fn write_gz_segment(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(contents.as_bytes()).unwrap();
    let _ = encoder.finish().unwrap();
    path
}

/// A segment with a single point, ending at `latest`.
pub(crate) fn segment_with_point(latest: u64, lat: f64, lng: f64) -> SegmentData {
    SegmentData {
        points: vec![fleetd_core::GpsPoint { lat, lng }],
        earliest_timestamp: latest.saturating_sub(100),
        latest_timestamp: latest,
        car_model: "COMMA 3X".into(),
        git_remote: "github.com/x/fw".into(),
        git_branch: "release".into(),
    }
}
