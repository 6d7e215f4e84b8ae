//! The application event set relayed to live device sessions.
//!
//! Events are a closed, versioned set. The wire encoding is JSON with a
//! `type` discriminator, e.g. `{"type":"test","message":"hi"}` — adding a
//! kind is a wire-format change and must stay in sync with device firmware.

use serde::{Deserialize, Serialize};

/// Discriminator for the closed set of event kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Connectivity probe, echoed to a live session verbatim.
    #[serde(rename = "test")]
    Test,
    /// A device's uploaded segment finished ingestion.
    #[serde(rename = "drive.processed")]
    DriveProcessed,
    /// Internal liveness marker; never forwarded to sessions.
    #[serde(rename = "device.ping")]
    DevicePing,
}

impl EventKind {
    /// The wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::DriveProcessed => "drive.processed",
            Self::DevicePing => "device.ping",
        }
    }
}

/// An application event published into the live-session hub.
///
/// Immutable, published at most once per occurrence, and encodable to a
/// compact textual form via [`DeviceEvent::encode`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeviceEvent {
    /// Connectivity probe.
    #[serde(rename = "test")]
    Test {
        /// Opaque text echoed to the session.
        message: String,
    },
    /// A segment upload was decoded and applied.
    #[serde(rename = "drive.processed")]
    DriveProcessed {
        /// Serial of the device that uploaded the segment.
        device: String,
        /// Number of GPS samples in the segment.
        points: usize,
        /// Latest sample timestamp, ns since epoch.
        latest_timestamp: u64,
    },
    /// Liveness marker for a device.
    #[serde(rename = "device.ping")]
    DevicePing {
        /// Serial of the device that pinged.
        device: String,
    },
}

impl DeviceEvent {
    /// The kind discriminator of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Test { .. } => EventKind::Test,
            Self::DriveProcessed { .. } => EventKind::DriveProcessed,
            Self::DevicePing { .. } => EventKind::DevicePing,
        }
    }

    /// Encode to the stable JSON wire form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let ev = DeviceEvent::Test {
            message: "hi".into(),
        };
        assert_eq!(ev.kind(), EventKind::Test);

        let ev = DeviceEvent::DriveProcessed {
            device: "d1".into(),
            points: 3,
            latest_timestamp: 99,
        };
        assert_eq!(ev.kind(), EventKind::DriveProcessed);

        let ev = DeviceEvent::DevicePing {
            device: "d1".into(),
        };
        assert_eq!(ev.kind(), EventKind::DevicePing);
    }

    #[test]
    fn kind_wire_names() {
        assert_eq!(EventKind::Test.as_str(), "test");
        assert_eq!(EventKind::DriveProcessed.as_str(), "drive.processed");
        assert_eq!(EventKind::DevicePing.as_str(), "device.ping");
    }

    #[test]
    fn test_event_encoding() {
        let ev = DeviceEvent::Test {
            message: "ping".into(),
        };
        let json: serde_json::Value = serde_json::from_str(&ev.encode().unwrap()).unwrap();
        assert_eq!(json["type"], "test");
        assert_eq!(json["message"], "ping");
    }

    #[test]
    fn drive_processed_encoding() {
        let ev = DeviceEvent::DriveProcessed {
            device: "3b59c1ab0f3c2a91".into(),
            points: 120,
            latest_timestamp: 1_700_000_000_000_000_000,
        };
        let json: serde_json::Value = serde_json::from_str(&ev.encode().unwrap()).unwrap();
        assert_eq!(json["type"], "drive.processed");
        assert_eq!(json["device"], "3b59c1ab0f3c2a91");
        assert_eq!(json["points"], 120);
        assert_eq!(json["latest_timestamp"], 1_700_000_000_000_000_000_u64);
    }

    #[test]
    fn decode_roundtrip() {
        let ev = DeviceEvent::DevicePing {
            device: "d2".into(),
        };
        let json = ev.encode().unwrap();
        let back: DeviceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn unknown_type_fails_to_decode() {
        let err = serde_json::from_str::<DeviceEvent>(r#"{"type":"bogus"}"#);
        assert!(err.is_err());
    }
}
