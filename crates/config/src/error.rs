//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A rule or router references a flow that is not defined
    #[error("router '{router}' references unknown flow '{flow}'")]
    UnknownFlow {
        /// Router (or rule id within it) holding the reference
        router: String,
        /// Name of the missing flow
        flow: String,
    },

    /// A flow references a filter type that is not registered
    #[error("flow '{flow}' uses unknown filter type '{filter}'")]
    UnknownFilterType {
        /// Flow holding the reference
        flow: String,
        /// The unregistered filter type name
        filter: String,
    },

    /// Required field missing
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component kind, e.g. "queue_consumer"
        component: &'static str,
        /// Instance name or id
        name: String,
        /// The missing field
        field: &'static str,
    },

    /// Duplicate name within a namespace that must be unique
    #[error("duplicate {component} name '{name}'")]
    DuplicateName {
        /// Component kind, e.g. "flow"
        component: &'static str,
        /// The conflicting name
        name: String,
    },
}
