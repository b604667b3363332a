// End-to-end dispatcher behavior over the in-memory store and scripted
// executors: retry semantics, the catch-up window, cancellation, and the
// staleness boundary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use slated_core::time::{bucket_key, minute_index};
use slated_executor::{Executor, ExecutorError};
use slated_scheduler::{DispatchEngine, ScheduleRequest, SchedulerHandle};
use slated_store::{ActionStore, MemoryStore};
use tokio::sync::Notify;

const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const PERIOD: Duration = Duration::from_secs(60);

/// Records every call; fails the first N calls of each kind when told to.
#[derive(Default)]
struct ScriptedExecutor {
    comment_failures: AtomicUsize,
    status_failures: AtomicUsize,
    comments: Mutex<Vec<(String, String)>>,
    statuses: Mutex<Vec<(String, bool)>>,
}

impl ScriptedExecutor {
    fn failing_comments(n: usize) -> Self {
        Self {
            comment_failures: AtomicUsize::new(n),
            ..Self::default()
        }
    }

    fn failing_statuses(n: usize) -> Self {
        Self {
            status_failures: AtomicUsize::new(n),
            ..Self::default()
        }
    }

    fn comment_count(&self) -> usize {
        self.comments.lock().unwrap().len()
    }

    fn status_count(&self) -> usize {
        self.statuses.lock().unwrap().len()
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn fail() -> ExecutorError {
    ExecutorError::Api {
        status: 500,
        message: "injected failure".into(),
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn post_comment(
        &self,
        target_id: &str,
        _credential: &str,
        text: &str,
    ) -> slated_executor::Result<()> {
        self.comments
            .lock()
            .unwrap()
            .push((target_id.to_string(), text.to_string()));
        if take_failure(&self.comment_failures) {
            return Err(fail());
        }
        Ok(())
    }

    async fn set_complete(
        &self,
        target_id: &str,
        _credential: &str,
        complete: bool,
    ) -> slated_executor::Result<()> {
        self.statuses
            .lock()
            .unwrap()
            .push((target_id.to_string(), complete));
        if take_failure(&self.status_failures) {
            return Err(fail());
        }
        Ok(())
    }
}

fn setup(
    exec: Arc<ScriptedExecutor>,
) -> (Arc<MemoryStore>, SchedulerHandle, DispatchEngine) {
    let store = Arc::new(MemoryStore::new());
    let handle = SchedulerHandle::new(store.clone(), RETENTION);
    let engine = DispatchEngine::new(store.clone(), exec, RETENTION, PERIOD);
    (store, handle, engine)
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn comment_request(at: DateTime<Utc>) -> ScheduleRequest {
    ScheduleRequest {
        target_id: "card-1".into(),
        comment: Some("see you then".into()),
        mark_complete: None,
        scheduled_at: at,
        credential: "tok".into(),
    }
}

fn status_request(at: DateTime<Utc>) -> ScheduleRequest {
    ScheduleRequest {
        target_id: "card-2".into(),
        comment: None,
        mark_complete: Some(true),
        scheduled_at: at,
        credential: "tok".into(),
    }
}

#[tokio::test]
async fn due_action_executes_and_record_is_deleted() {
    let exec = Arc::new(ScriptedExecutor::default());
    let (store, handle, engine) = setup(exec.clone());
    let at = base();

    let key = handle.schedule(comment_request(at)).await.unwrap();
    let report = engine.try_sweep(at).await.unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.details.processed, vec![key.clone()]);
    assert_eq!(store.get(&key).await.unwrap(), None);
    assert_eq!(store.get(&bucket_key(minute_index(at))).await.unwrap(), None);
    assert_eq!(exec.comment_count(), 1);
}

#[tokio::test]
async fn failed_execution_leaves_record_fully_intact() {
    let exec = Arc::new(ScriptedExecutor::failing_comments(1));
    let (store, handle, engine) = setup(exec);
    let at = base();

    let key = handle.schedule(comment_request(at)).await.unwrap();
    let before = store.get(&key).await.unwrap().unwrap();

    let report = engine.try_sweep(at).await.unwrap();

    assert_eq!(report.processed, 0);
    assert_eq!(report.errors, 1);
    // Never half-applied: the stored record is byte-identical.
    assert_eq!(store.get(&key).await.unwrap(), Some(before));
    let raw = store.get(&bucket_key(minute_index(at))).await.unwrap();
    assert!(raw.unwrap().contains(&key));
}

#[tokio::test]
async fn retries_every_sweep_until_success() {
    let exec = Arc::new(ScriptedExecutor::failing_comments(2));
    let (store, handle, engine) = setup(exec.clone());
    let at = base();

    let key = handle.schedule(comment_request(at)).await.unwrap();
    let bucket = bucket_key(minute_index(at));

    for sweep in 1..=2 {
        let report = engine.try_sweep(at).await.unwrap();
        assert_eq!(report.errors, 1, "sweep {sweep} should fail");
        assert!(store.get(&bucket).await.unwrap().unwrap().contains(&key));
        assert!(store.get(&key).await.unwrap().is_some());
    }

    let report = engine.try_sweep(at).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(store.get(&key).await.unwrap(), None);
    assert_eq!(store.get(&bucket).await.unwrap(), None);
    assert_eq!(exec.comment_count(), 3);
}

#[tokio::test]
async fn canceled_key_is_never_executed() {
    let exec = Arc::new(ScriptedExecutor::default());
    let (_store, handle, engine) = setup(exec.clone());
    let at = base();

    let key = handle.schedule(comment_request(at)).await.unwrap();
    handle.cancel(&key).await.unwrap();

    let report = engine.try_sweep(at).await.unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(report.errors, 0);
    assert_eq!(exec.comment_count(), 0);
}

#[tokio::test]
async fn cancel_of_one_member_leaves_the_rest_due() {
    let exec = Arc::new(ScriptedExecutor::default());
    let (_store, handle, engine) = setup(exec.clone());
    let at = base();

    let canceled = handle.schedule(comment_request(at)).await.unwrap();
    let kept = handle.schedule(status_request(at)).await.unwrap();
    handle.cancel(&canceled).await.unwrap();

    let report = engine.try_sweep(at).await.unwrap();
    assert_eq!(report.details.processed, vec![kept]);
    assert_eq!(exec.comment_count(), 0);
    assert_eq!(exec.status_count(), 1);
}

#[tokio::test]
async fn comment_and_status_actions_clear_in_one_sweep() {
    let exec = Arc::new(ScriptedExecutor::default());
    let (store, handle, engine) = setup(exec.clone());
    // Both due 65 s out; the sweep covering that minute picks up both.
    let at = base() + chrono::Duration::seconds(65);

    let k1 = handle.schedule(comment_request(at)).await.unwrap();
    let k2 = handle.schedule(status_request(at)).await.unwrap();

    let now = base() + chrono::Duration::seconds(119);
    let report = engine.try_sweep(now).await.unwrap();

    assert_eq!(report.processed, 2);
    assert!(report.details.processed.contains(&k1));
    assert!(report.details.processed.contains(&k2));
    assert_eq!(store.get(&k1).await.unwrap(), None);
    assert_eq!(store.get(&k2).await.unwrap(), None);
    assert_eq!(exec.comment_count(), 1);
    assert_eq!(exec.status_count(), 1);
}

#[tokio::test]
async fn previous_minute_is_caught_up() {
    let exec = Arc::new(ScriptedExecutor::default());
    let (store, handle, engine) = setup(exec);
    let at = base() + chrono::Duration::seconds(30);

    let key = handle.schedule(comment_request(at)).await.unwrap();

    // Tick lands in the next minute; the minus-one pass still finds it.
    let now = base() + chrono::Duration::seconds(70);
    let report = engine.try_sweep(now).await.unwrap();

    assert_eq!(report.details.processed, vec![key.clone()]);
    assert_eq!(store.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn bucket_older_than_catchup_window_is_never_swept() {
    let exec = Arc::new(ScriptedExecutor::default());
    let (store, handle, engine) = setup(exec.clone());
    let at = base();

    let key = handle.schedule(comment_request(at)).await.unwrap();

    // Simulated trigger outage: first sweep happens two minutes later.
    let now = base() + chrono::Duration::seconds(125);
    let report = engine.try_sweep(now).await.unwrap();

    assert_eq!(report.processed, 0);
    assert_eq!(exec.comment_count(), 0);
    // The action stays inert — only its TTL will remove it.
    assert!(store.get(&key).await.unwrap().is_some());
    assert!(store
        .get(&bucket_key(minute_index(at)))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn not_yet_due_entry_is_retained_without_executing() {
    let exec = Arc::new(ScriptedExecutor::default());
    let (_store, handle, engine) = setup(exec.clone());
    // Due at :30; swept at :00 of the same minute.
    let at = base() + chrono::Duration::seconds(30);

    let key = handle.schedule(comment_request(at)).await.unwrap();

    let report = engine.try_sweep(base()).await.unwrap();
    assert_eq!(report.pending, 1);
    assert_eq!(report.details.pending, vec![key.clone()]);
    assert_eq!(exec.comment_count(), 0);

    let report = engine.try_sweep(at).await.unwrap();
    assert_eq!(report.details.processed, vec![key]);
}

#[tokio::test]
async fn partial_failure_retains_and_reruns_the_comment() {
    let exec = Arc::new(ScriptedExecutor::failing_statuses(1));
    let (store, handle, engine) = setup(exec.clone());
    let at = base();

    let req = ScheduleRequest {
        target_id: "card-3".into(),
        comment: Some("done".into()),
        mark_complete: Some(true),
        scheduled_at: at,
        credential: "tok".into(),
    };
    let key = handle.schedule(req).await.unwrap();

    // Comment lands, flag call fails, whole action is retained.
    let report = engine.try_sweep(at).await.unwrap();
    assert_eq!(report.errors, 1);
    assert_eq!(exec.comment_count(), 1);
    assert_eq!(exec.status_count(), 1);
    assert!(store.get(&key).await.unwrap().is_some());

    // The retry replays both sub-actions, comment included.
    let report = engine.try_sweep(at).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(exec.comment_count(), 2);
    assert_eq!(exec.status_count(), 2);
    assert_eq!(store.get(&key).await.unwrap(), None);
}

/// Parks inside the executor until released, to hold a sweep in flight.
struct ParkingExecutor {
    release: Notify,
}

#[async_trait]
impl Executor for ParkingExecutor {
    async fn post_comment(
        &self,
        _target_id: &str,
        _credential: &str,
        _text: &str,
    ) -> slated_executor::Result<()> {
        self.release.notified().await;
        Ok(())
    }

    async fn set_complete(
        &self,
        _target_id: &str,
        _credential: &str,
        _complete: bool,
    ) -> slated_executor::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn sweep_in_flight_skips_the_next_trigger() {
    let exec = Arc::new(ParkingExecutor {
        release: Notify::new(),
    });
    let store = Arc::new(MemoryStore::new());
    let handle = SchedulerHandle::new(store.clone(), RETENTION);
    let engine = Arc::new(DispatchEngine::new(
        store.clone(),
        exec.clone(),
        RETENTION,
        PERIOD,
    ));
    let at = base();

    handle.schedule(comment_request(at)).await.unwrap();

    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.try_sweep(at).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Second trigger while the first sweep is parked in the executor.
    assert!(engine.try_sweep(at).await.is_none());

    exec.release.notify_one();
    let report = first.await.unwrap().expect("first sweep completed");
    assert_eq!(report.processed, 1);

    // Guard released once the sweep finishes.
    assert!(engine.try_sweep(at).await.is_some());
}
