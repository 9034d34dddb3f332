//! Flow engine error types

use thiserror::Error;

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors that can occur while building or running flows
#[derive(Debug, Error)]
pub enum FlowError {
    /// A flow references a filter type with no registered factory
    #[error("filter type '{0}' is not registered")]
    FilterNotFound(String),

    /// A flow id has no configuration to materialize from
    #[error("flow '{0}' is not configured")]
    FlowNotFound(String),

    /// A dispatch names a router that was never registered
    #[error("router '{0}' is not registered")]
    RouterNotFound(String),

    /// A rule id has no configuration
    #[error("routing rule '{0}' is not registered")]
    RuleNotFound(String),

    /// A resolved reference points at something that does not exist
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A filter factory rejected its parameters
    #[error("filter '{filter}' configuration invalid: {reason}")]
    FilterConfig {
        /// Filter type name
        filter: String,
        /// What the factory objected to
        reason: String,
    },

    /// A filter failed while processing a context
    #[error("filter '{filter}' failed: {reason}")]
    FilterFailed {
        /// Filter name
        filter: String,
        /// Failure detail
        reason: String,
    },

    /// Replay envelope could not be decoded
    #[error("failed to decode replay request: {0}")]
    Decode(String),

    /// Queue interaction failed inside a filter
    #[error(transparent)]
    Queue(#[from] esgate_queue::QueueError),

    /// Bulk codec failure inside a filter
    #[error(transparent)]
    Bulk(#[from] esgate_bulk::BulkError),
}

impl FlowError {
    /// Create a filter-config error
    pub fn filter_config(filter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FilterConfig {
            filter: filter.into(),
            reason: reason.into(),
        }
    }

    /// Create a filter-failed error
    pub fn filter_failed(filter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FilterFailed {
            filter: filter.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-configuration error
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}
