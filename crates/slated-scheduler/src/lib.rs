//! `slated-scheduler` — time-bucketed scheduling over a TTL key-value store.
//!
//! # Overview
//!
//! Actions are persisted as individual store records; a minute-resolution
//! bucket index maps each minute to the keys due in it, so a sweep inspects
//! only the due buckets instead of scanning every pending record.
//!
//! [`SchedulerHandle`] serves the write path (`schedule`, `cancel`);
//! [`DispatchEngine`] runs the periodic sweep that executes due actions,
//! retries failures, and prunes emptied buckets.
//!
//! # Delivery semantics
//!
//! At-least-once. A failed action is retried every sweep with no backoff and
//! no cap until the store's per-key expiry discards it. The bucket
//! read-modify-write in `schedule` and the sweep write-back are unprotected
//! races; a lost membership update strands the action record until its TTL
//! clears it.

pub mod bucket;
pub mod engine;
pub mod error;
pub mod report;
pub mod scheduler;

pub use engine::DispatchEngine;
pub use error::{Result, SchedulerError};
pub use report::{SweepDetails, SweepError, SweepReport};
pub use scheduler::{ScheduleRequest, SchedulerHandle};
