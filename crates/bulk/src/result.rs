//! Per-response bulk statistics
//!
//! Summarizes what happened to a bulk request: bucket totals, per-index
//! and per-action counts, and a bounded list of error details with
//! truncated request/response excerpts. The processing filter attaches
//! this to the request context under [`BULK_RESPONSE_STATUS_KEY`].

use std::collections::BTreeMap;

use serde::Serialize;

/// Context scratch key the bulk result is attached under
pub const BULK_RESPONSE_STATUS_KEY: &str = "bulk_response_status";

/// Bucket totals for one bulk response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkTotals {
    /// Items in the request
    pub items: usize,
    /// Items with per-item status in `[200, 299]`
    pub success: usize,
    /// Items classified transient
    pub retryable: usize,
    /// Items classified permanent failures
    pub invalid: usize,
}

/// Detail of one failed bulk item
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkErrorDetail {
    /// Target index, when the action metadata named one
    pub index: Option<String>,
    /// Action verb
    pub action: String,
    /// Document id, when present
    pub id: Option<String>,
    /// Upstream error type, e.g. `version_conflict_engine_exception`
    pub error_type: Option<String>,
    /// Upstream error reason
    pub reason: Option<String>,
    /// Per-item status
    pub status: Option<u16>,
    /// Truncated original request bytes for this item
    pub request_excerpt: String,
    /// Truncated response item document
    pub response_excerpt: String,
}

/// Summary of one bulk response, attached to the request context
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkResult {
    /// Bucket totals
    pub totals: BulkTotals,

    /// The response carried a different item count than the request
    pub response_length_mismatch: bool,

    /// Item count per target index
    pub index_stats: BTreeMap<String, usize>,

    /// Item count per action verb
    pub action_stats: BTreeMap<String, usize>,

    /// Details of failed items, bounded by configuration
    pub error_details: Vec<BulkErrorDetail>,
}

impl BulkResult {
    /// Whether any item failed
    pub fn contains_error(&self) -> bool {
        self.response_length_mismatch || self.totals.retryable > 0 || self.totals.invalid > 0
    }
}
