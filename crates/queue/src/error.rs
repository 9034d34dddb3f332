//! Queue error types

use thiserror::Error;

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors surfaced by a durable queue backend
#[derive(Debug, Error)]
pub enum QueueError {
    /// The backend rejected or lost a push; consumers treat this as fatal
    #[error("push to queue '{queue}' failed: {reason}")]
    PushFailed {
        /// Target queue name
        queue: String,
        /// Backend-specific reason
        reason: String,
    },

    /// The backend failed while popping
    #[error("pop from queue '{queue}' failed: {reason}")]
    PopFailed {
        /// Source queue name
        queue: String,
        /// Backend-specific reason
        reason: String,
    },

    /// The backend is shutting down or unreachable
    #[error("queue backend unavailable: {0}")]
    Unavailable(String),
}

impl QueueError {
    /// Create a push failure
    pub fn push_failed(queue: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PushFailed {
            queue: queue.into(),
            reason: reason.into(),
        }
    }

    /// Create a pop failure
    pub fn pop_failed(queue: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PopFailed {
            queue: queue.into(),
            reason: reason.into(),
        }
    }
}
