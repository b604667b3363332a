use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use slated_core::time::{action_key, minute_index};
use slated_core::types::{ActionKind, ScheduledAction};
use slated_store::ActionStore;
use tracing::{debug, info};

use crate::bucket;
use crate::error::{Result, SchedulerError};

/// A validated-enough schedule request. Field presence is checked here;
/// nothing about the credential is.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub target_id: String,
    pub comment: Option<String>,
    pub mark_complete: Option<bool>,
    pub scheduled_at: DateTime<Utc>,
    pub credential: String,
}

/// Write path of the engine: `schedule` and `cancel`.
///
/// Shares the store with the dispatcher; safe to clone into handlers.
#[derive(Clone)]
pub struct SchedulerHandle {
    store: Arc<dyn ActionStore>,
    retention: Duration,
}

impl SchedulerHandle {
    pub fn new(store: Arc<dyn ActionStore>, retention: Duration) -> Self {
        Self { store, retention }
    }

    /// Persist an action and register it in its minute bucket.
    ///
    /// Returns the generated key — the only handle the caller gets for a
    /// later `cancel`; there is no lookup path. Rejection happens before
    /// any write, so a failed request leaves no partial state.
    pub async fn schedule(&self, req: ScheduleRequest) -> Result<String> {
        if req.target_id.is_empty() || req.credential.is_empty() {
            return Err(SchedulerError::InvalidRequest(
                "targetId and credential are required".into(),
            ));
        }
        // An empty comment string counts as no comment.
        let comment = req.comment.filter(|c| !c.is_empty());
        let kind = ActionKind::from_parts(comment.is_some(), req.mark_complete.is_some())
            .ok_or_else(|| {
                SchedulerError::InvalidRequest(
                    "at least one of comment or markComplete is required".into(),
                )
            })?;

        let key = action_key(req.scheduled_at);
        let action = ScheduledAction {
            key: key.clone(),
            target_id: req.target_id,
            kind,
            comment,
            mark_complete: req.mark_complete,
            scheduled_at: req.scheduled_at,
            created_at: Utc::now(),
            credential: req.credential,
        };

        self.store
            .put(&key, &serde_json::to_string(&action)?, self.retention)
            .await?;

        // Bucket read-modify-write: not atomic against concurrent schedules
        // on the same minute. See module docs in `bucket`.
        let minute = minute_index(action.scheduled_at);
        let mut members = bucket::load_members(self.store.as_ref(), minute).await?;
        if !members.contains(&key) {
            members.push(key.clone());
        }
        bucket::store_members(self.store.as_ref(), minute, &members, self.retention).await?;

        info!(key = %key, minute, kind = %kind, "action scheduled");
        Ok(key)
    }

    /// Remove an action and its bucket membership.
    ///
    /// Idempotent: a key that is already gone (executed, expired, or
    /// canceled twice) still succeeds. A sweep that read the record just
    /// before this delete may still execute it; no ordering is guaranteed.
    pub async fn cancel(&self, key: &str) -> Result<()> {
        let Some(raw) = self.store.get(key).await? else {
            debug!(key, "cancel: record already absent");
            return Ok(());
        };

        let action: ScheduledAction = serde_json::from_str(&raw)?;
        let minute = minute_index(action.scheduled_at);
        let mut members = bucket::load_members(self.store.as_ref(), minute).await?;
        members.retain(|k| k != key);
        bucket::store_members(self.store.as_ref(), minute, &members, self.retention).await?;

        self.store.delete(key).await?;
        info!(key, minute, "action canceled");
        Ok(())
    }
}
