//! `slated-executor` — the outbound side of a fired action.
//!
//! The dispatcher only sees the [`Executor`] trait, so engine tests run
//! against scripted fakes. [`HttpExecutor`] is the real adapter calling the
//! board service's REST API.

pub mod error;
pub mod http;

use async_trait::async_trait;

pub use error::{ExecutorError, Result};
pub use http::HttpExecutor;

/// Performs the side-effecting calls against a card on the board service.
///
/// Both calls take the caller-supplied `credential` verbatim; nothing in
/// this crate inspects or validates it.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Push a text comment to the card.
    async fn post_comment(&self, target_id: &str, credential: &str, text: &str) -> Result<()>;

    /// Set the card's completion flag.
    async fn set_complete(&self, target_id: &str, credential: &str, complete: bool) -> Result<()>;
}
