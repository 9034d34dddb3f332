//! Diff pipeline error types

use thiserror::Error;

/// Result type for diff operations
pub type Result<T> = std::result::Result<T, DiffError>;

/// Errors that stop a diff pipeline
#[derive(Debug, Error)]
pub enum DiffError {
    /// File IO during sort, feed or report
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Queue interaction failed
    #[error(transparent)]
    Queue(#[from] esgate_queue::QueueError),

    /// A persisted diff record could not be decoded
    #[error("invalid diff record: {0}")]
    Record(String),
}
