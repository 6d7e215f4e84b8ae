//! # fleetd-ingest
//!
//! Ingestion path for uploaded segment logs: a bounded mailbox feeding a
//! single sequential worker that decompresses each file, decodes the
//! embedded telemetry, and merges the device's last-known position under
//! an ordering-aware, idempotent update policy.
//!
//! Exactly one worker consumes the mailbox, so all device mutations issued
//! through this path are linearized without a lock. Producers block when
//! the mailbox is full; that backpressure is the only flow control.
//!
//! Every failure is scoped to a single file: the item is counted, logged,
//! and dropped, and the worker moves on. The queue survives unbounded
//! malformed input.

#![deny(unsafe_code)]

pub mod decode;
pub mod errors;
pub mod queue;
mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use decode::{DecodeError, JsonLinesDecoder, SegmentDecoder};
pub use errors::{IngestError, IngestStage};
pub use queue::{LogQueue, QUEUE_DEPTH, WorkItem};
