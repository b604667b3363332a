use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("board API error ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
