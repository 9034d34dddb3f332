//! Bulk response filter configuration

use esgate_bulk::{BulkResponseParseConfig, RetryRules};
use serde::Deserialize;

/// Parameters of one `bulk_response_process` instance
///
/// Queue names left empty disable the corresponding routing. Tag lists
/// are applied to the context when their condition holds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BulkResponseConfig {
    /// Only collect statistics; skip queue routing and tagging
    pub stats_only: bool,

    /// Queue receiving fully/partially succeeded request bodies
    pub success_queue: String,

    /// Queue receiving non-retryable (dead-letter) items
    pub invalid_queue: String,

    /// Queue receiving retryable items
    pub failure_queue: String,

    /// Truncation bound for the rate-limited error log excerpt
    pub message_truncate_size: usize,

    /// Run the retry flow inline before enqueueing retryable items
    pub partial_failure_retry: bool,

    /// Bound on inline retry-flow invocations per context; 0 = unbounded
    pub partial_failure_max_retry_times: usize,

    /// Delay before the inline retry flow runs
    #[serde(rename = "partial_failure_retry_latency_in_ms")]
    pub partial_failure_retry_latency_ms: u64,

    /// Keep processing the flow when the whole response failed
    pub continue_on_all_error: bool,

    /// Keep processing the flow when any item failed
    pub continue_on_any_error: bool,

    /// Keep processing the flow when every item succeeded
    pub continue_on_success: bool,

    /// Tags applied when every item succeeded
    #[serde(rename = "tag_on_all_success")]
    pub tags_on_all_success: Vec<String>,

    /// Tags applied when the response status was not 200/201
    #[serde(rename = "tag_on_none_2xx")]
    pub tags_on_none_2xx: Vec<String>,

    /// Tags applied when every item was non-retryable
    #[serde(rename = "tag_on_all_invalid")]
    pub tags_on_all_invalid: Vec<String>,

    /// Tags applied when every item was a retryable failure
    #[serde(rename = "tag_on_all_failure")]
    pub tags_on_all_failure: Vec<String>,

    /// Tags applied when any item failed
    #[serde(rename = "tag_on_any_error")]
    pub tags_on_any_error: Vec<String>,

    /// Tags applied when some items succeeded amidst failures
    #[serde(rename = "tag_on_partial_success")]
    pub tags_on_partial_success: Vec<String>,

    /// Tags applied when some items are retryable
    #[serde(rename = "tag_on_partial_failure")]
    pub tags_on_partial_failure: Vec<String>,

    /// Tags applied when some items are non-retryable
    #[serde(rename = "tag_on_partial_invalid")]
    pub tags_on_partial_invalid: Vec<String>,

    /// Flow run inline before retryable items are enqueued
    pub retry_flow: String,

    /// Status-code retry policy
    pub retry_rules: RetryRules,

    /// Statistics and buffer knobs
    #[serde(rename = "response_handle")]
    pub parse: BulkResponseParseConfig,
}

impl Default for BulkResponseConfig {
    fn default() -> Self {
        Self {
            stats_only: false,
            success_queue: String::new(),
            invalid_queue: String::new(),
            failure_queue: String::new(),
            message_truncate_size: 1024,
            partial_failure_retry: false,
            partial_failure_max_retry_times: 0,
            partial_failure_retry_latency_ms: 0,
            continue_on_all_error: false,
            continue_on_any_error: false,
            continue_on_success: false,
            tags_on_all_success: Vec::new(),
            tags_on_none_2xx: Vec::new(),
            tags_on_all_invalid: Vec::new(),
            tags_on_all_failure: Vec::new(),
            tags_on_any_error: Vec::new(),
            tags_on_partial_success: Vec::new(),
            tags_on_partial_failure: Vec::new(),
            tags_on_partial_invalid: Vec::new(),
            retry_flow: String::new(),
            retry_rules: RetryRules::default(),
            parse: BulkResponseParseConfig::default(),
        }
    }
}
