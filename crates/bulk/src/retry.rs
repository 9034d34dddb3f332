//! Status-code retry policy
//!
//! Decides, per bulk item or whole response, whether a failure status is
//! worth replaying. Matches upstream conventions: 429 and 5xx are
//! transient, most 4xx are permanent, 409 is permanent unless version
//! conflicts are expected to resolve.

use serde::Deserialize;

/// Destination bucket for one bulk item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemBucket {
    /// Per-item status in `[200, 299]`
    Success,
    /// Transient failure, replay through the failure queue
    Retryable,
    /// Permanent failure, dead-letter through the invalid queue
    Invalid,
}

/// Configurable retry policy over response status codes
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetryRules {
    /// Retry HTTP 429 (throttled)
    #[serde(rename = "retry_429")]
    pub retry_429: bool,

    /// Retry HTTP 409 (version conflict)
    #[serde(rename = "retry_409")]
    pub retry_409: bool,

    /// Retry remaining 4xx statuses
    #[serde(rename = "retry_4xx")]
    pub retry_4xx: bool,

    /// Fallback for statuses no explicit rule covers
    #[serde(rename = "default")]
    pub default_retry: bool,
}

impl Default for RetryRules {
    fn default() -> Self {
        Self {
            retry_429: true,
            retry_409: false,
            retry_4xx: false,
            default_retry: true,
        }
    }
}

impl RetryRules {
    /// Whether a failure with this status should be replayed
    pub fn retryable(&self, status: u16) -> bool {
        match status {
            429 => self.retry_429,
            409 => self.retry_409,
            500.. => true,
            400..=499 => self.retry_4xx,
            _ => self.default_retry,
        }
    }

    /// Bucket for a per-item status
    ///
    /// A missing status is treated as retryable: the item's outcome is
    /// unknown and replay is safe for idempotent bulk writes.
    pub fn classify(&self, status: Option<u16>) -> ItemBucket {
        let Some(status) = status else {
            return ItemBucket::Retryable;
        };
        if (200..300).contains(&status) {
            ItemBucket::Success
        } else if self.retryable(status) {
            ItemBucket::Retryable
        } else {
            ItemBucket::Invalid
        }
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
