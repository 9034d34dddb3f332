//! Consumer error types

use thiserror::Error;

/// Result type for consumer operations
pub type Result<T> = std::result::Result<T, ConsumerError>;

/// Errors that stop a consumer worker
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Queue interaction failed; fatal, the pool is cancelled
    #[error(transparent)]
    Queue(#[from] esgate_queue::QueueError),

    /// The worker pool was asked to start with no workers
    #[error("worker_size must be at least 1")]
    NoWorkers,
}
