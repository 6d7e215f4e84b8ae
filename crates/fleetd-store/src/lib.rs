//! # fleetd-store
//!
//! SQLite persistence for device records: an `r2d2` connection pool with
//! WAL pragmas, idempotent migrations, a stateless repository, and the
//! [`SqliteDeviceStore`] adapter implementing the
//! [`fleetd_core::DeviceStore`] contract for the rest of the service.

#![deny(unsafe_code)]

pub mod connection;
pub mod device_repo;
pub mod errors;
pub mod migrations;
pub mod sqlite_store;

pub use connection::{ConnectionConfig, ConnectionPool, new_file, new_in_memory};
pub use device_repo::DeviceRepo;
pub use errors::{RepoError, Result};
pub use migrations::run_migrations;
pub use sqlite_store::SqliteDeviceStore;
