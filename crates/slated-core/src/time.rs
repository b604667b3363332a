//! Minute-bucket arithmetic and key generation.
//!
//! One minute of resolution matches the dispatcher period: finer wastes an
//! index write per schedule, coarser grows the records inspected per sweep.

use chrono::{DateTime, Utc};

pub const MS_PER_MINUTE: i64 = 60_000;

/// Store key prefix for action records.
pub const ACTION_PREFIX: &str = "act_";
/// Store key prefix for bucket membership records.
pub const BUCKET_PREFIX: &str = "bucket_";

/// Map an instant to its bucket index: `floor(ms / 60_000)`.
pub fn minute_index(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis().div_euclid(MS_PER_MINUTE)
}

/// Store key for the bucket at `minute`.
pub fn bucket_key(minute: i64) -> String {
    format!("{BUCKET_PREFIX}{minute}")
}

/// Generate an action key: scheduled-time millis plus a random suffix.
///
/// The time prefix keeps keys orderable for diagnostics; the uuid suffix
/// makes collisions between concurrent schedule calls statistically
/// negligible.
pub fn action_key(scheduled_at: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{ACTION_PREFIX}{}_{}",
        scheduled_at.timestamp_millis(),
        &suffix[..9]
    )
}
