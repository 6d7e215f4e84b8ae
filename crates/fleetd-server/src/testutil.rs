//! In-crate fakes for server and hub tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use fleetd_core::{Device, DeviceStore, StoreError};

use crate::ws::session::{SessionError, SessionSink};

/// In-memory device store that counts liveness touches per device.
pub(crate) struct MemoryStore {
    devices: Mutex<HashMap<String, Device>>,
    pings: Mutex<HashMap<String, usize>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            pings: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn insert(&self, serial: &str) {
        let device = Device::new(serial, "2026-01-01T00:00:00Z");
        let _ = self.devices.lock().insert(serial.to_string(), device);
    }

    pub(crate) fn get(&self, serial: &str) -> Option<Device> {
        self.devices.lock().get(serial).cloned()
    }

    pub(crate) fn ping_count(&self, serial: &str) -> usize {
        self.pings.lock().get(serial).copied().unwrap_or(0)
    }
}

impl DeviceStore for MemoryStore {
    fn find_by_serial(&self, serial: &str) -> Result<Device, StoreError> {
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
        *self.pings.lock().entry(serial.to_string()).or_insert(0) += 1;
        Ok(())
    }
}

/// Session sink that records written frames and can fail one write.
pub(crate) struct RecordingSession {
    id: String,
    device_serial: String,
    frames: Mutex<Vec<String>>,
    fail_next: AtomicBool,
}

impl RecordingSession {
    pub(crate) fn new(device_serial: &str) -> Self {
        Self {
            id: format!("sess_test_{device_serial}"),
            device_serial: device_serial.to_string(),
            frames: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    pub(crate) fn frames(&self) -> Vec<String> {
        self.frames.lock().clone()
    }

    pub(crate) fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    pub(crate) fn fail_next_write(&self) {
        self.fail_next.store(true, Ordering::Relaxed);
    }
}

impl SessionSink for RecordingSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_serial(&self) -> &str {
        &self.device_serial
    }

    fn write_text(&self, frame: String) -> Result<(), SessionError> {
        if self.fail_next.swap(false, Ordering::Relaxed) {
            return Err(SessionError::Closed);
        }
        self.frames.lock().push(frame);
        Ok(())
    }
}
