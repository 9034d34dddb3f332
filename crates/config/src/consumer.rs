//! Disk-queue consumer configuration
//!
//! # Example
//!
//! ```toml
//! [[queue_consumer]]
//! input_queue = "bulk-failure"
//! elasticsearch = "prod"
//! worker_size = 4
//! compress = true
//! waiting_after = ["bulk-priority"]
//! ```

use serde::Deserialize;

const DEFAULT_DOC_BUFFER_SIZE: usize = 256 * 1024;

/// Configuration for one disk-queue consumer pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Number of parallel workers draining the input queue
    pub worker_size: usize,

    /// Queue pop timeout; workers re-check cancellation on expiry
    pub idle_timeout_in_seconds: u64,

    /// Queue to drain
    pub input_queue: String,

    /// Retryable failures land here; empty derives `<input>-failure`
    pub failure_queue: String,

    /// Dead letters land here; empty derives `<input>-invalid`
    pub invalid_queue: String,

    /// Succeeded items of partially failed bulks land here;
    /// empty derives `<input>-partial-success`
    pub partial_success_queue: String,

    /// Whether to persist the succeeded part of partially failed bulks
    pub save_partial_success_requests: bool,

    /// Target cluster id (resolved through cluster metadata)
    pub elasticsearch: String,

    /// Queues whose depth must reach zero before draining the input
    pub waiting_after: Vec<String>,

    /// Gzip request bodies before dispatch
    pub compress: bool,

    /// Bulk items larger than this are dead-lettered
    pub doc_buffer_size: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            worker_size: 1,
            idle_timeout_in_seconds: 5,
            input_queue: String::new(),
            failure_queue: String::new(),
            invalid_queue: String::new(),
            partial_success_queue: String::new(),
            save_partial_success_requests: false,
            elasticsearch: String::new(),
            waiting_after: Vec::new(),
            compress: false,
            doc_buffer_size: DEFAULT_DOC_BUFFER_SIZE,
        }
    }
}

impl ConsumerConfig {
    /// Failure queue name, derived from the input queue when unset
    pub fn failure_queue(&self) -> String {
        if self.failure_queue.is_empty() {
            format!("{}-failure", self.input_queue)
        } else {
            self.failure_queue.clone()
        }
    }

    /// Invalid (dead-letter) queue name, derived when unset
    pub fn invalid_queue(&self) -> String {
        if self.invalid_queue.is_empty() {
            format!("{}-invalid", self.input_queue)
        } else {
            self.invalid_queue.clone()
        }
    }

    /// Partial-success queue name, derived when unset
    pub fn partial_success_queue(&self) -> String {
        if self.partial_success_queue.is_empty() {
            format!("{}-partial-success", self.input_queue)
        } else {
            self.partial_success_queue.clone()
        }
    }
}
