//! Flow and filter instance configuration
//!
//! A flow is a named, ordered list of filter instances. Each instance names
//! a registered filter type and carries a free-form parameter table that
//! the filter's factory interprets.

use serde::Deserialize;

/// Free-form parameter table passed to a filter factory
///
/// Factories convert this into their own typed config via serde
/// (`toml::Value::Table(params).try_into()`).
pub type FilterParams = toml::value::Table;

/// A named, ordered filter chain
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Flow name, unique process-wide
    pub name: String,

    /// Filter instances in execution order
    pub filters: Vec<FilterConfig>,
}

/// One filter instance within a flow
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Instance id, unique within the flow
    pub id: String,

    /// Registered filter type name (selects the factory)
    pub name: String,

    /// Factory-specific parameters
    pub parameters: FilterParams,
}

impl FilterConfig {
    /// Parameters as a `toml::Value` table for serde-based conversion
    pub fn parameters_value(&self) -> toml::Value {
        toml::Value::Table(self.parameters.clone())
    }
}
