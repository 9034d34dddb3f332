//! Bulk codec error types

use thiserror::Error;

/// Result type for bulk codec operations
pub type Result<T> = std::result::Result<T, BulkError>;

/// Errors that can occur while parsing bulk bodies
#[derive(Debug, Error)]
pub enum BulkError {
    /// An action line is not a recognizable bulk action object
    #[error("malformed bulk request at item {ordinal}: {reason}")]
    MalformedRequest {
        /// Zero-based input item ordinal
        ordinal: usize,
        /// Parse failure detail
        reason: String,
    },

    /// The response body is not a bulk response document
    #[error("malformed bulk response: {0}")]
    MalformedResponse(String),
}

impl BulkError {
    /// Create a malformed-request error
    pub fn malformed_request(ordinal: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            ordinal,
            reason: reason.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed_response(reason: impl Into<String>) -> Self {
        Self::MalformedResponse(reason.into())
    }
}
