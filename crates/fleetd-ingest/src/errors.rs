//! Stage-labeled ingestion errors.

use thiserror::Error;

use fleetd_core::StoreError;

use crate::decode::DecodeError;

/// The processing stage at which a segment was dropped.
///
/// Stage names are stable: they label the `ingest_errors_total` metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestStage {
    /// Opening the uploaded file.
    OpenFile,
    /// Looking up the owning device.
    FindDevice,
    /// Decompressing and decoding the segment.
    DecodeSegmentData,
    /// Writing the merged fix back to storage.
    UpdateDevice,
}

impl IngestStage {
    /// The metric label for this stage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenFile => "open_file",
            Self::FindDevice => "find_device",
            Self::DecodeSegmentData => "decode_segment_data",
            Self::UpdateDevice => "update_device",
        }
    }
}

/// A single-item ingestion failure. The item is dropped; nothing retries.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The uploaded file could not be opened.
    #[error("opening segment file: {0}")]
    OpenFile(#[source] std::io::Error),

    /// The owning device is unknown or storage was unavailable.
    #[error("looking up device: {0}")]
    FindDevice(#[source] StoreError),

    /// The segment could not be decompressed or decoded.
    #[error("decoding segment data: {0}")]
    Decode(#[source] DecodeError),

    /// The merged fix could not be written back.
    #[error("updating device: {0}")]
    UpdateDevice(#[source] StoreError),
}

impl IngestError {
    /// The stage this failure belongs to.
    pub fn stage(&self) -> IngestStage {
        match self {
            Self::OpenFile(_) => IngestStage::OpenFile,
            Self::FindDevice(_) => IngestStage::FindDevice,
            Self::Decode(_) => IngestStage::DecodeSegmentData,
            Self::UpdateDevice(_) => IngestStage::UpdateDevice,
        }
    }
}
