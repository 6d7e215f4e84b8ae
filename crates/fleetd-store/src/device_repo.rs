//! Device repository — row access for the `devices` table.
//!
//! Stateless; every method takes `&Connection` so callers control pooling
//! and transactions.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use fleetd_core::Device;

use crate::errors::{RepoError, Result};

/// Device repository.
pub struct DeviceRepo;

impl DeviceRepo {
    /// Insert a new device with no recorded fix.
    pub fn create(conn: &Connection, serial: &str) -> Result<Device> {
        let created_at = Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO devices (serial, created_at) VALUES (?1, ?2)",
            params![serial, created_at],
        )?;
        Self::find_by_serial(conn, serial)
    }

    /// Look up a device by serial.
    pub fn find_by_serial(conn: &Connection, serial: &str) -> Result<Device> {
        conn.query_row(
            "SELECT serial, last_fix_time, last_fix_lat, last_fix_lng,
                    last_ping_time, created_at
             FROM devices WHERE serial = ?1",
            params![serial],
            device_from_row,
        )
        .optional()?
        .ok_or_else(|| RepoError::DeviceNotFound(serial.to_string()))
    }

    /// Replace the device's last fix in a single statement.
    pub fn update_last_fix(
        conn: &Connection,
        serial: &str,
        timestamp: u64,
        lat: f64,
        lng: f64,
    ) -> Result<()> {
        let ts = to_column_ts(timestamp)?;
        let rows = conn.execute(
            "UPDATE devices
             SET last_fix_time = ?1, last_fix_lat = ?2, last_fix_lng = ?3
             WHERE serial = ?4",
            params![ts, lat, lng, serial],
        )?;
        if rows == 0 {
            return Err(RepoError::DeviceNotFound(serial.to_string()));
        }
        Ok(())
    }

    /// All devices, ordered by serial.
    pub fn list(conn: &Connection) -> Result<Vec<Device>> {
        let mut stmt = conn.prepare(
            "SELECT serial, last_fix_time, last_fix_lat, last_fix_lng,
                    last_ping_time, created_at
             FROM devices ORDER BY serial",
        )?;
        let devices = stmt
            .query_map([], device_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(devices)
    }

    /// Record a liveness timestamp for the device.
    pub fn touch_last_ping(conn: &Connection, serial: &str, timestamp: u64) -> Result<()> {
        let ts = to_column_ts(timestamp)?;
        let rows = conn.execute(
            "UPDATE devices SET last_ping_time = ?1 WHERE serial = ?2",
            params![ts, serial],
        )?;
        if rows == 0 {
            return Err(RepoError::DeviceNotFound(serial.to_string()));
        }
        Ok(())
    }
}

fn device_from_row(row: &Row<'_>) -> rusqlite::Result<Device> {
    Ok(Device {
        serial: row.get(0)?,
        last_fix_time: row.get::<_, Option<i64>>(1)?.map(from_column_ts),
        last_fix_lat: row.get(2)?,
        last_fix_lng: row.get(3)?,
        last_ping_time: row.get::<_, Option<i64>>(4)?.map(from_column_ts),
        created_at: row.get(5)?,
    })
}

// Nanosecond epoch timestamps are stored as INTEGER; i64 holds them until
// the year 2262.
fn to_column_ts(timestamp: u64) -> Result<i64> {
    i64::try_from(timestamp).map_err(|_| RepoError::TimestampOutOfRange(timestamp))
}

fn from_column_ts(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
