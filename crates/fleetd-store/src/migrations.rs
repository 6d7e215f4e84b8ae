//! Schema migrations, idempotent by construction.

use rusqlite::Connection;

use crate::errors::Result;

/// Create or update the device schema. Safe to run on every startup.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS devices (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             serial TEXT NOT NULL UNIQUE,
             last_fix_time INTEGER,
             last_fix_lat REAL,
             last_fix_lng REAL,
             last_ping_time INTEGER,
             created_at TEXT NOT NULL DEFAULT (datetime('now'))
         );",
    )?;
    Ok(())
}
