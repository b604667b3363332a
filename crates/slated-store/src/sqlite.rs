use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::Result;
use crate::ActionStore;

/// Durable kv adapter on rusqlite.
///
/// Thread-safe: wraps the connection in a Mutex, one adapter per process.
/// Expiry is lazy — reads filter on `expires_at`, and each write sweeps out
/// rows whose deadline has passed.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

/// Initialise the kv schema in `conn` (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key        TEXT    NOT NULL PRIMARY KEY,
            value      TEXT    NOT NULL,
            expires_at INTEGER NOT NULL    -- unix millis
        ) STRICT;

        -- Write-time purge: DELETE … WHERE expires_at <= ?
        CREATE INDEX IF NOT EXISTS idx_kv_expires_at ON kv (expires_at);
        ",
    )?;
    Ok(())
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::new(conn)
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[async_trait]
impl ActionStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock().unwrap();
        let value = db
            .query_row(
                "SELECT value FROM kv WHERE key = ?1 AND expires_at > ?2",
                rusqlite::params![key, Self::now_ms()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let db = self.db.lock().unwrap();
        let now = Self::now_ms();

        // Opportunistic purge keeps dead rows from piling up between reads.
        let purged = db.execute("DELETE FROM kv WHERE expires_at <= ?1", [now])?;
        if purged > 0 {
            debug!(purged, "purged expired kv rows");
        }

        db.execute(
            "INSERT OR REPLACE INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, now + ttl.as_millis() as i64],
        )?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let db = self.db.lock().unwrap();
        let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
        let mut stmt = db.prepare(
            "SELECT key FROM kv
             WHERE key LIKE ?1 ESCAPE '\\' AND expires_at > ?2
             ORDER BY key",
        )?;
        let keys = stmt
            .query_map(rusqlite::params![pattern, Self::now_ms()], |row| {
                row.get::<_, String>(0)
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(keys)
    }
}
