//! # fleetd-core
//!
//! Shared domain model for the fleetd vehicle-telemetry service: device
//! records, decoded segment data, the application event set, and the
//! storage contract the ingestion and live-session layers are built
//! against.
//!
//! This crate is deliberately free of I/O. Storage engines, codecs, and
//! transports live in the outer crates and plug into the traits defined
//! here.

#![deny(unsafe_code)]

pub mod device;
pub mod events;
pub mod segment;
pub mod store;

pub use device::Device;
pub use events::{DeviceEvent, EventKind};
pub use segment::{GpsPoint, SegmentData};
pub use store::{DeviceStore, StoreError};
