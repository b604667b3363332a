//! `slated-core` — shared types, config, and time arithmetic.
//!
//! Everything here is pure or near-pure: no I/O beyond reading the config
//! file. The bucket arithmetic in [`time`] is the single source of truth for
//! mapping an instant to its index bucket — `schedule`, `cancel`, and the
//! dispatcher all go through it.

pub mod config;
pub mod error;
pub mod time;
pub mod types;

pub use error::{Result, SlatedError};
pub use types::{ActionKind, ScheduledAction};
