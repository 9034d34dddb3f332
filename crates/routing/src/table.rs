//! Route table: ordered rules compiled from configuration
//!
//! Compiled once at startup; `resolve` allocates only the returned chain.

use esgate_config::{RouterConfig, RuleConfig};

use crate::pattern::path_matches;

/// Outcome of resolving one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Id of the matching rule; `None` when the default flow was used
    pub rule_id: Option<String>,

    /// Flow names to execute, in order, tracing flow included
    pub flows: Vec<String>,
}

impl Resolution {
    /// Whether resolution produced anything to execute
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Ordered routing rules for one router
#[derive(Debug, Clone)]
pub struct RouteTable {
    config: RouterConfig,
}

impl RouteTable {
    /// Compile a table from its configuration
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Router name for logs and dispatch
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Resolve the flow chain for a request
    ///
    /// Rules are evaluated in declared order and the first match wins; an
    /// empty method list matches any method. Unmatched requests use the
    /// default flow. The tracing flow, when configured, is appended last.
    pub fn resolve(&self, method: &str, path: &str) -> Resolution {
        let mut resolution = match self.matching_rule(method, path) {
            Some(rule) => Resolution {
                rule_id: Some(rule.id.clone()),
                flows: rule.flow.clone(),
            },
            None => Resolution {
                rule_id: None,
                flows: if self.config.default_flow.is_empty() {
                    Vec::new()
                } else {
                    vec![self.config.default_flow.clone()]
                },
            },
        };

        if !self.config.tracing_flow.is_empty() {
            resolution.flows.push(self.config.tracing_flow.clone());
        }
        resolution
    }

    fn matching_rule(&self, method: &str, path: &str) -> Option<&RuleConfig> {
        self.config.rules.iter().find(|rule| {
            let method_ok = rule.method.is_empty()
                || rule.method.iter().any(|m| m.eq_ignore_ascii_case(method));
            method_ok && rule.pattern.iter().any(|p| path_matches(p, path))
        })
    }
}
