//! The segment decode boundary and the line-delimited JSON codec.
//!
//! Uploaded segments are gzip streams of newline-delimited JSON records.
//! The decoder is behind a trait so the worker can be tested without real
//! payloads and so the wire codec can change without touching the queue.

use std::io::{BufRead, BufReader, Read};

use serde::Deserialize;
use thiserror::Error;

use fleetd_core::{GpsPoint, SegmentData};

/// Errors from the segment decode boundary.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The stream could not be read (includes decompression failures).
    #[error("segment read failed: {0}")]
    Io(#[from] std::io::Error),

    /// A record did not parse.
    #[error("malformed segment record: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The stream held no records at all.
    #[error("segment contains no records")]
    Empty,
}

/// Turns a decompressed byte stream into structured telemetry.
pub trait SegmentDecoder: Send + Sync {
    /// Decode one segment. The reader yields the decompressed stream.
    fn decode(&self, reader: &mut dyn Read) -> Result<SegmentData, DecodeError>;
}

/// One line of a segment log.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SegmentRecord {
    /// Device and software identity, written once at segment start.
    Init {
        car_model: String,
        git_remote: String,
        git_branch: String,
    },
    /// A GPS sample.
    Gps { lat: f64, lng: f64, timestamp: u64 },
}

/// Decoder for newline-delimited JSON segment logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonLinesDecoder;

impl SegmentDecoder for JsonLinesDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<SegmentData, DecodeError> {
        let mut data = SegmentData::default();
        let mut records = 0usize;

        for line in BufReader::new(reader).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records += 1;
            match serde_json::from_str::<SegmentRecord>(&line)? {
                SegmentRecord::Init {
                    car_model,
                    git_remote,
                    git_branch,
                } => {
                    data.car_model = car_model;
                    data.git_remote = git_remote;
                    data.git_branch = git_branch;
                }
                SegmentRecord::Gps {
                    lat,
                    lng,
                    timestamp,
                } => {
                    if data.points.is_empty() || timestamp < data.earliest_timestamp {
                        data.earliest_timestamp = timestamp;
                    }
                    if timestamp > data.latest_timestamp {
                        data.latest_timestamp = timestamp;
                    }
                    data.points.push(GpsPoint { lat, lng });
                }
            }
        }

        if records == 0 {
            return Err(DecodeError::Empty);
        }
        Ok(data)
    }
}
