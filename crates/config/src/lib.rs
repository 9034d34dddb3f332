//! Esgate Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use esgate_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[[flow]]\nname = \"forward\"").unwrap();
//! assert_eq!(config.flow.len(), 1);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [[router]]
//! name = "default"
//! default_flow = "forward"
//!
//! [[router.rules]]
//! id = "bulk"
//! method = ["POST", "PUT"]
//! pattern = ["/_bulk", "/:index/_bulk"]
//! flow = ["async_indexing"]
//!
//! [[flow]]
//! name = "async_indexing"
//!
//! [[flow.filters]]
//! id = "bulk_check"
//! name = "bulk_response_process"
//! parameters = { failure_queue = "bulk-failure" }
//!
//! [[queue_consumer]]
//! input_queue = "bulk-failure"
//! elasticsearch = "prod"
//! ```

mod consumer;
mod diff;
mod error;
mod flow;
mod router;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use consumer::ConsumerConfig;
pub use diff::DiffConfig;
pub use error::{ConfigError, Result};
pub use flow::{FilterConfig, FilterParams, FlowConfig};
pub use router::{RouterConfig, RuleConfig};

/// Main configuration structure
///
/// All sections are optional; an empty config is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Routers mapping (method, path) to flows
    pub router: Vec<RouterConfig>,

    /// Named filter flows
    pub flow: Vec<FlowConfig>,

    /// Disk-queue consumer pipelines
    pub queue_consumer: Vec<ConsumerConfig>,

    /// Index diff pipelines
    pub index_diff: Vec<DiffConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        content.parse()
    }

    /// Validate internal references
    ///
    /// Checks that every rule and tracing/default flow points at a flow
    /// defined in this config, and that every filter instance uses one of
    /// `known_filter_types`.
    pub fn validate(&self, known_filter_types: &[&str]) -> Result<()> {
        validation::validate(self, known_filter_types)
    }

    /// Look up a flow config by name
    pub fn find_flow(&self, name: &str) -> Option<&FlowConfig> {
        self.flow.iter().find(|f| f.name == name)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
