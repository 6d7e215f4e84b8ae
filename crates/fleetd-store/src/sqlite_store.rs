//! [`SqliteDeviceStore`] — adapts the pooled repository to the
//! [`fleetd_core::DeviceStore`] contract consumed by ingestion and the
//! live-session hub.

use chrono::Utc;
use tracing::debug;

use fleetd_core::{Device, DeviceStore, StoreError};

use crate::connection::ConnectionPool;
use crate::device_repo::DeviceRepo;
use crate::errors::RepoError;

/// SQLite-backed implementation of the device store contract.
#[derive(Clone)]
pub struct SqliteDeviceStore {
    pool: ConnectionPool,
}

impl SqliteDeviceStore {
    /// Wrap a connection pool. Migrations must already have run.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

impl DeviceStore for SqliteDeviceStore {
    fn find_by_serial(&self, serial: &str) -> Result<Device, StoreError> {
        let conn = self.pool.get().map_err(|e| map_err(e.into()))?;
        DeviceRepo::find_by_serial(&conn, serial).map_err(map_err)
    }

    fn update_last_fix(
        &self,
        serial: &str,
        timestamp: u64,
        lat: f64,
        lng: f64,
    ) -> Result<(), StoreError> {
        let conn = self.pool.get().map_err(|e| map_err(e.into()))?;
        debug!(device = serial, timestamp, "updating last fix");
        DeviceRepo::update_last_fix(&conn, serial, timestamp, lat, lng).map_err(map_err)
    }

    fn touch_last_ping(&self, serial: &str) -> Result<(), StoreError> {
        let conn = self.pool.get().map_err(|e| map_err(e.into()))?;
        let now = now_ns();
        DeviceRepo::touch_last_ping(&conn, serial, now).map_err(map_err)
    }
}

fn map_err(err: RepoError) -> StoreError {
    match err {
        RepoError::DeviceNotFound(serial) => StoreError::NotFound(serial),
        other => StoreError::Unavailable(other.to_string()),
    }
}

fn now_ns() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|ns| u64::try_from(ns).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionConfig, new_in_memory};
    use crate::migrations::run_migrations;

    fn store_with_device(serial: &str) -> SqliteDeviceStore {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        let _ = DeviceRepo::create(&conn, serial).unwrap();
        drop(conn);
        SqliteDeviceStore::new(pool)
    }

    #[test]
    fn find_known_device() {
        let store = store_with_device("d1");
        let device = store.find_by_serial("d1").unwrap();
        assert_eq!(device.serial, "d1");
    }

    #[test]
    fn find_unknown_maps_to_not_found() {
        let store = store_with_device("d1");
        let err = store.find_by_serial("ghost").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn update_last_fix_persists() {
        let store = store_with_device("d1");
        store.update_last_fix("d1", 5_000, 1.0, 2.0).unwrap();
        let device = store.find_by_serial("d1").unwrap();
        assert_eq!(device.last_fix_time, Some(5_000));
        assert_eq!(device.last_fix_lat, Some(1.0));
        assert_eq!(device.last_fix_lng, Some(2.0));
    }

    #[test]
    fn touch_last_ping_sets_recent_timestamp() {
        let store = store_with_device("d1");
        store.touch_last_ping("d1").unwrap();
        let device = store.find_by_serial("d1").unwrap();
        assert!(device.last_ping_time.unwrap() > 0);
    }
}
