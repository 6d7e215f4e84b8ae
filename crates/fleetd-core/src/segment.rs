//! Decoded trip-segment data, as produced by the segment decode boundary.

use serde::{Deserialize, Serialize};

/// A single GPS coordinate sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Structured telemetry decoded from one uploaded segment log.
///
/// Scoped to a single ingestion pass; never persisted directly. The point
/// sequence preserves recording order, so the last element is the most
/// recent coordinate of the trip.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentData {
    /// GPS samples in recording order. May be empty.
    pub points: Vec<GpsPoint>,
    /// Earliest sample timestamp in the segment, ns since epoch.
    pub earliest_timestamp: u64,
    /// Latest sample timestamp in the segment, ns since epoch.
    pub latest_timestamp: u64,
    /// Vehicle model reported by the device.
    pub car_model: String,
    /// Source-control remote of the device software.
    pub git_remote: String,
    /// Source-control branch of the device software.
    pub git_branch: String,
}

impl SegmentData {
    /// The most recent coordinate of the trip, if any samples were recorded.
    pub fn last_point(&self) -> Option<GpsPoint> {
        self.points.last().copied()
    }
}
