use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use slated_core::time::minute_index;
use slated_core::types::ScheduledAction;
use slated_executor::Executor;
use slated_store::ActionStore;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::bucket;
use crate::report::{SweepError, SweepReport};

/// Periodic dispatcher: sweeps the current and previous minute buckets,
/// executes due actions, retries failures on later sweeps, prunes emptied
/// buckets.
///
/// One sequential pass per invocation, one key at a time. An in-process
/// guard skips a sweep while another is in flight, so the tick loop and the
/// manual trigger never overlap through the same engine.
pub struct DispatchEngine {
    store: Arc<dyn ActionStore>,
    executor: Arc<dyn Executor>,
    retention: Duration,
    sweep_period: Duration,
    sweeping: AtomicBool,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn ActionStore>,
        executor: Arc<dyn Executor>,
        retention: Duration,
        sweep_period: Duration,
    ) -> Self {
        Self {
            store,
            executor,
            retention,
            sweep_period,
            sweeping: AtomicBool::new(false),
        }
    }

    /// Main event loop. Ticks every sweep period until `shutdown`
    /// broadcasts `true`.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("dispatch engine started");

        let mut interval = tokio::time::interval(self.sweep_period);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // Detached so a slow sweep never delays the next tick;
                    // the in-flight guard turns overlap into a skip.
                    let engine = Arc::clone(&self);
                    tokio::spawn(async move {
                        match engine.try_sweep(Utc::now()).await {
                            Some(report) if report.processed > 0 || report.errors > 0 => {
                                info!(
                                    processed = report.processed,
                                    errors = report.errors,
                                    minute = report.minute,
                                    "sweep complete"
                                );
                            }
                            Some(_) => {}
                            None => warn!("previous sweep still running; tick skipped"),
                        }
                    });
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("dispatch engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Run one sweep at `now`, unless a sweep is already in flight —
    /// then `None`.
    pub async fn try_sweep(&self, now: DateTime<Utc>) -> Option<SweepReport> {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        let report = self.sweep(now).await;
        self.sweeping.store(false, Ordering::SeqCst);
        Some(report)
    }

    /// Sweep the bucket for the current minute, then the previous one.
    ///
    /// The minus-one pass absorbs trigger jitter, clock skew, and writes
    /// that landed just after a tick. Nothing older is ever inspected: an
    /// action stranded further back stays untouched until its TTL clears
    /// it.
    async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let current = minute_index(now);
        let mut report = SweepReport::new(now, current);

        for minute in [current, current - 1] {
            self.sweep_bucket(minute, now, &mut report).await;
        }

        report.finalise();
        report
    }

    async fn sweep_bucket(&self, minute: i64, now: DateTime<Utc>, report: &mut SweepReport) {
        let members = match bucket::load_members(self.store.as_ref(), minute).await {
            Ok(m) if m.is_empty() => return,
            Ok(m) => m,
            Err(e) => {
                // Unreadable bucket: leave it for the next sweep (or its TTL).
                error!(minute, "failed to load bucket: {e}");
                report.details.errors.push(SweepError {
                    key: slated_core::time::bucket_key(minute),
                    error: e.to_string(),
                });
                return;
            }
        };

        debug!(minute, members = members.len(), "sweeping bucket");

        let mut retained: Vec<String> = Vec::new();
        for key in members {
            match self.process_key(&key, now).await {
                KeyOutcome::Executed => report.details.processed.push(key),
                KeyOutcome::Dropped => {}
                KeyOutcome::NotDue => {
                    report.details.pending.push(key.clone());
                    retained.push(key);
                }
                KeyOutcome::Failed(message) => {
                    report.details.errors.push(SweepError {
                        key: key.clone(),
                        error: message,
                    });
                    retained.push(key);
                }
            }
        }

        if let Err(e) =
            bucket::store_members(self.store.as_ref(), minute, &retained, self.retention).await
        {
            // Write-back lost: members stay in the old bucket revision and
            // get re-inspected next sweep; executed records are already
            // deleted, so their keys just read as absent then.
            error!(minute, "failed to write back bucket: {e}");
        }
    }

    /// Handle one bucket member. Failure isolation: any error is reported
    /// and the key retained, and the sweep moves on to the next key.
    async fn process_key(&self, key: &str, now: DateTime<Utc>) -> KeyOutcome {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                // Already canceled or expired; drop the membership.
                debug!(key, "record absent; dropping from bucket");
                return KeyOutcome::Dropped;
            }
            Err(e) => {
                warn!(key, "store read failed: {e}");
                return KeyOutcome::Failed(e.to_string());
            }
        };

        let action: ScheduledAction = match serde_json::from_str(&raw) {
            Ok(a) => a,
            Err(e) => {
                warn!(key, "bad action JSON: {e}");
                return KeyOutcome::Failed(e.to_string());
            }
        };

        // Defensive: a correctly bucketed current-minute entry is always
        // due, but never execute early.
        if action.scheduled_at > now {
            return KeyOutcome::NotDue;
        }

        if let Err(e) = self.execute(&action).await {
            warn!(key, target = %action.target_id, "execution failed: {e}");
            return KeyOutcome::Failed(e.to_string());
        }

        match self.store.delete(key).await {
            Ok(()) => {
                info!(key, target = %action.target_id, "action executed");
                KeyOutcome::Executed
            }
            Err(e) => {
                // Executed but not deleted: retained, so the next sweep
                // runs it again. At-least-once, accepted.
                warn!(key, "record delete failed after execution: {e}");
                KeyOutcome::Failed(e.to_string())
            }
        }
    }

    /// One attempt: comment first, then the completion flag.
    ///
    /// A failure after the comment succeeded retains the whole action, so
    /// the retry re-posts the comment. There is no per-sub-action
    /// completion tracking; comment delivery is at-least-once per action.
    async fn execute(&self, action: &ScheduledAction) -> slated_executor::Result<()> {
        if let Some(text) = action.comment.as_deref() {
            self.executor
                .post_comment(&action.target_id, &action.credential, text)
                .await?;
        }

        if let Some(complete) = action.mark_complete {
            self.executor
                .set_complete(&action.target_id, &action.credential, complete)
                .await?;
        }

        Ok(())
    }
}

enum KeyOutcome {
    /// Executed and deleted; key leaves the bucket.
    Executed,
    /// Record absent; key leaves the bucket.
    Dropped,
    /// Not yet due; key stays.
    NotDue,
    /// Executor or store failure; key stays for the next sweep.
    Failed(String),
}
