//! # fleetd-server
//!
//! The service's HTTP/WebSocket surface and the live device event hub.
//!
//! Devices upload compressed segment logs over HTTP (fed into the
//! ingestion queue) and hold a persistent WebSocket for bidirectional
//! event exchange. The hub bridges application events into whichever
//! sessions are attached, and deliberately drops events when none are —
//! delivery is best-effort and never durable.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod server;
pub mod shutdown;
pub mod ws;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::ServerConfig;
pub use server::{AppState, FleetServer, ServiceContext};
pub use shutdown::Shutdown;
pub use ws::hub::DeviceEventHub;
pub use ws::session::{DeviceSession, SessionError, SessionSink};
