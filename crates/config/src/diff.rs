//! Index diff configuration
//!
//! # Example
//!
//! ```toml
//! [[index_diff]]
//! source_queue = "cluster_a"
//! target_queue = "cluster_b"
//! partition_size = 10
//! data_dir = "/var/lib/esgate"
//! log_dir = "/var/log/esgate"
//! ```

use serde::Deserialize;

/// Configuration for one index-diff pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Number of independent sort+merge partitions
    pub partition_size: usize,

    /// Write the human-readable text report after the merge completes
    pub text_report: bool,

    /// Embed the compare items in diff records; disabling keeps records
    /// key-only and the report loses its hash columns
    pub keep_source: bool,

    /// Bound of each merge channel
    pub buffer_size: usize,

    /// Queue receiving serialized diff records
    pub diff_queue: String,

    /// Left-hand input stream name
    pub source_queue: String,

    /// Right-hand input stream name
    pub target_queue: String,

    /// Directory holding `diff/<queue><partition>` input files
    pub data_dir: String,

    /// Directory receiving `diff_result/<src>_vs_<tgt>/<ts>.log` reports
    pub log_dir: String,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            partition_size: 10,
            text_report: true,
            keep_source: true,
            buffer_size: 1,
            diff_queue: "diff_result".to_string(),
            source_queue: "source".to_string(),
            target_queue: "target".to_string(),
            data_dir: "data".to_string(),
            log_dir: "log".to_string(),
        }
    }
}
