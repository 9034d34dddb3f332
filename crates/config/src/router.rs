//! Router configuration
//!
//! A router owns an ordered list of rules. Rules are evaluated in declared
//! order; first match wins. Unmatched requests fall back to the default
//! flow. An optional tracing flow is appended to every resolved chain.
//!
//! # Example
//!
//! ```toml
//! [[router]]
//! name = "default"
//! default_flow = "forward"
//! tracing_flow = "request_logging"
//!
//! [[router.rules]]
//! id = "bulk_writes"
//! method = ["POST", "PUT"]
//! pattern = ["/_bulk", "/:index/_bulk"]
//! flow = ["async_indexing"]
//!
//! [[router.rules]]
//! id = "search"
//! method = []            # empty = any method
//! pattern = ["/*index/_search"]
//! flow = ["cache_first"]
//! ```

use serde::Deserialize;

/// Router configuration: default flow plus ordered matching rules
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Router name (referenced by the listener entry)
    pub name: String,

    /// Flow used when no rule matches
    pub default_flow: String,

    /// Flow appended to every resolved chain; empty disables tracing
    pub tracing_flow: String,

    /// Rules, evaluated in declared order
    pub rules: Vec<RuleConfig>,
}

/// A single routing rule
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Unique rule id
    pub id: String,

    /// Human-readable description
    #[serde(rename = "desc")]
    pub description: String,

    /// HTTP methods this rule applies to; empty matches any method
    pub method: Vec<String>,

    /// Path patterns; any match qualifies. Supports exact paths,
    /// `*suffix` trailing wildcards and `:param` single segments.
    pub pattern: Vec<String>,

    /// Flow chain executed on match, concatenated in order
    pub flow: Vec<String>,
}
