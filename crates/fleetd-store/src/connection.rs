//! `SQLite` connection pool with WAL mode and foreign keys enabled.
//!
//! Uses `r2d2` connection pooling with the `r2d2_sqlite` backend. The
//! [`PragmaCustomizer`] runs on each new connection so WAL mode, foreign
//! keys, and the busy timeout are set pool-wide.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::Result;

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Alias for a pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Configuration for the connection pool.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum pool size (default: 16).
    pub pool_size: u32,
    /// Busy timeout in milliseconds (default: 30000).
    pub busy_timeout_ms: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 16,
            busy_timeout_ms: 30_000,
        }
    }
}

/// `SQLite` pragma customizer that runs on each new connection.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA foreign_keys = ON;\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))?;
        Ok(())
    }
}

/// Create an in-memory connection pool (for testing).
///
/// A `:memory:` database is private to its connection, so the pool is
/// capped at one connection regardless of `config.pool_size`.
pub fn new_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder()
        .max_size(1)
        .connection_timeout(std::time::Duration::from_secs(5))
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout_ms: config.busy_timeout_ms,
        }))
        .build(manager)?;
    Ok(pool)
}

/// Create a file-backed connection pool.
pub fn new_file(path: &str, config: &ConnectionConfig) -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(std::time::Duration::from_secs(5))
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout_ms: config.busy_timeout_ms,
        }))
        .build(manager)?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_pool_creates_successfully() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let foreign_keys: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn in_memory_pool_is_single_connection() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        assert_eq!(pool.max_size(), 1);
    }

    #[test]
    fn file_pool_creates_successfully() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = new_file(path.to_str().unwrap(), &ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode, "wal");
    }

    #[test]
    fn file_pool_respects_pool_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let config = ConnectionConfig {
            pool_size: 4,
            ..Default::default()
        };
        let pool = new_file(path.to_str().unwrap(), &config).unwrap();
        assert_eq!(pool.max_size(), 4);
    }
}
