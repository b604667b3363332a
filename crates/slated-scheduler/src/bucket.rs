//! Bucket membership codec.
//!
//! A bucket is stored as a JSON array of action keys under
//! `bucket_<minute_index>`. Membership updates are read-modify-write with
//! no atomicity: two concurrent writers to the same minute can lose one
//! writer's update. The dropped action stays reachable through its own
//! TTL-bounded record, so it expires instead of leaking.

use slated_core::time::bucket_key;
use slated_store::ActionStore;

use crate::error::Result;

/// Decode a stored member set.
pub fn decode_members(raw: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(raw)?)
}

/// Encode a member set for storage.
pub fn encode_members(members: &[String]) -> Result<String> {
    Ok(serde_json::to_string(members)?)
}

/// Load the member set for `minute`; an absent bucket is empty.
pub async fn load_members(store: &dyn ActionStore, minute: i64) -> Result<Vec<String>> {
    match store.get(&bucket_key(minute)).await? {
        Some(raw) => decode_members(&raw),
        None => Ok(Vec::new()),
    }
}

/// Write back the member set for `minute`: delete the bucket when empty,
/// otherwise rewrite it with a fresh retention TTL.
pub async fn store_members(
    store: &dyn ActionStore,
    minute: i64,
    members: &[String],
    ttl: std::time::Duration,
) -> Result<()> {
    let key = bucket_key(minute);
    if members.is_empty() {
        store.delete(&key).await?;
    } else {
        store.put(&key, &encode_members(members)?, ttl).await?;
    }
    Ok(())
}
