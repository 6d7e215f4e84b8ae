//! The storage contract consumed by ingestion and the live-session hub.
//!
//! The concrete engine lives in `fleetd-store`; this trait keeps both
//! consumers testable against in-memory fakes.

use thiserror::Error;

use crate::device::Device;

/// Errors surfaced by a [`DeviceStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No device row exists for the given serial.
    #[error("device not found: {0}")]
    NotFound(String),

    /// The storage engine failed; the device retains its prior value.
    #[error("storage error: {0}")]
    Unavailable(String),
}

/// Lookup and field-update contract for device records.
///
/// Implementations must apply `update_last_fix` atomically: on error the
/// device keeps its previous fix (no partial write).
pub trait DeviceStore: Send + Sync {
    /// Look up a device by its serial.
    fn find_by_serial(&self, serial: &str) -> Result<Device, StoreError>;

    /// Replace the device's last fix with `(timestamp, lat, lng)`.
    fn update_last_fix(
        &self,
        serial: &str,
        timestamp: u64,
        lat: f64,
        lng: f64,
    ) -> Result<(), StoreError>;

    /// Record that a live session touched the device just now.
    fn touch_last_ping(&self, serial: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StoreError::NotFound("3b59c1ab0f3c2a91".into());
        assert_eq!(err.to_string(), "device not found: 3b59c1ab0f3c2a91");
    }

    #[test]
    fn unavailable_display() {
        let err = StoreError::Unavailable("disk full".into());
        assert_eq!(err.to_string(), "storage error: disk full");
    }
}
