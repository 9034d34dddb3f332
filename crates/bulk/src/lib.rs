//! Esgate Bulk - Elasticsearch `_bulk` wire codec
//!
//! The bulk API is newline-delimited JSON: each logical item is an action
//! line (`{"index":{"_index":"i","_id":"1"}}`) optionally followed by a
//! source line; deletes carry no source. The response mirrors the request
//! item for item. This crate parses both sides, correlates them, and
//! partitions every item into one of three buckets:
//!
//! - **success** - per-item status in `[200, 299]`
//! - **retryable** - transient per-item failure under the configured
//!   [`RetryRules`] (429, 5xx, optionally 409/4xx)
//! - **invalid** - a failure that will not succeed on retry (dead letter)
//!
//! Buckets are re-encoded from the exact original line bytes, so any
//! bucket is a standalone bulk body once it gets its trailing newline.
//!
//! # Modules
//!
//! - `buffer` - pooled byte buffers counting logical messages
//! - `codec` - request splitting into action+source pairs
//! - `response` - response correlation, classification, bucket fill
//! - `result` - per-response statistics attached to the request context
//! - `retry` - status-code retry policy

mod buffer;
mod codec;
mod error;
mod response;
mod result;
mod retry;

pub use buffer::{BulkBuffer, BulkBufferPool, PoolMetricsSnapshot};
pub use codec::{split_request, ActionKind, RequestItem};
pub use error::{BulkError, Result};
pub use response::{
    handle_bulk_response, parse_response, BulkOutcome, BulkResponseParseConfig, ResponseItem,
};
pub use result::{BulkErrorDetail, BulkResult, BulkTotals, BULK_RESPONSE_STATUS_KEY};
pub use retry::{ItemBucket, RetryRules};
