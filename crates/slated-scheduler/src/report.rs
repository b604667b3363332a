use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one dispatcher sweep. Returned by the manual trigger and
/// logged by the periodic loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Count of actions executed and deleted this sweep.
    pub processed: usize,
    /// Count of keys inspected but not yet due.
    pub pending: usize,
    /// Count of per-key failures (executor or store); all retained for retry.
    pub errors: usize,
    pub details: SweepDetails,
    pub timestamp: DateTime<Utc>,
    /// The current minute index; the sweep covered this bucket and the one
    /// before it.
    pub minute: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepDetails {
    pub processed: Vec<String>,
    pub pending: Vec<String>,
    pub errors: Vec<SweepError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepError {
    pub key: String,
    pub error: String,
}

impl SweepReport {
    pub(crate) fn new(timestamp: DateTime<Utc>, minute: i64) -> Self {
        Self {
            processed: 0,
            pending: 0,
            errors: 0,
            details: SweepDetails::default(),
            timestamp,
            minute,
        }
    }

    /// Sync the counters to the detail lists after a bucket pass.
    pub(crate) fn finalise(&mut self) {
        self.processed = self.details.processed.len();
        self.pending = self.details.pending.len();
        self.errors = self.details.errors.len();
    }
}
