//! `slated-store` — the key-value store contract the engine runs on.
//!
//! The scheduler and dispatcher only ever see [`ActionStore`]: get /
//! put-with-TTL / delete / list. An absent key is `Ok(None)`, never an
//! error. All read-modify-write races live above this boundary, so a swap
//! to a transactional backend only changes the adapter.
//!
//! Two adapters ship: [`MemoryStore`] (in-process, backs the engine tests)
//! and [`SqliteStore`] (durable kv table with an `expires_at` column).

pub mod error;
pub mod memory;
pub mod sqlite;

use std::time::Duration;

use async_trait::async_trait;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key-value store with per-key expiry.
///
/// `put` overwrites both the value and any prior TTL. `list` exists for
/// diagnostics only — the bucket index exists precisely so the hot path
/// never scans keys.
#[async_trait]
pub trait ActionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Keys starting with `prefix`, expired entries excluded.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
