//! Device records and the last-fix acceptance policy.

use serde::{Deserialize, Serialize};

/// A telemetry-reporting device as seen by this service.
///
/// Only the fields this service reads or mutates are modeled; the rest of
/// the device row belongs to the storage layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique serial naming the device (the upload and session key).
    pub serial: String,
    /// Timestamp of the most recently accepted GPS fix, ns since epoch.
    pub last_fix_time: Option<u64>,
    /// Latitude of the most recently accepted GPS fix.
    pub last_fix_lat: Option<f64>,
    /// Longitude of the most recently accepted GPS fix.
    pub last_fix_lng: Option<f64>,
    /// Last time a live session touched this device, ns since epoch.
    pub last_ping_time: Option<u64>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

impl Device {
    /// A device with no recorded fixes or liveness.
    pub fn new(serial: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            last_fix_time: None,
            last_fix_lat: None,
            last_fix_lng: None,
            last_ping_time: None,
            created_at: created_at.into(),
        }
    }

    /// Whether a segment ending at `latest_timestamp` should replace the
    /// recorded last fix.
    ///
    /// True when no fix has been recorded yet, or when the segment is
    /// strictly newer. Equal or older timestamps are rejected so duplicate
    /// and late replays leave the device untouched.
    pub fn accepts_fix(&self, latest_timestamp: u64) -> bool {
        self.last_fix_time.is_none_or(|t| latest_timestamp > t)
    }
}
