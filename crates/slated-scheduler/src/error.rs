use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Underlying store error.
    #[error("store error: {0}")]
    Store(#[from] slated_store::StoreError),

    /// The schedule request is missing fields or describes a no-op.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A persisted record or bucket failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
