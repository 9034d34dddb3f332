//! Cross-reference validation
//!
//! Catches broken name references at load time rather than on first
//! request: rules must point at defined flows, flows must use registered
//! filter types, names must be unique, consumers must name their input.

use std::collections::HashSet;

use crate::{Config, ConfigError, Result};

pub(crate) fn validate(config: &Config, known_filter_types: &[&str]) -> Result<()> {
    let mut flow_names = HashSet::new();
    for flow in &config.flow {
        if !flow_names.insert(flow.name.as_str()) {
            return Err(ConfigError::DuplicateName {
                component: "flow",
                name: flow.name.clone(),
            });
        }
        for filter in &flow.filters {
            if !known_filter_types.contains(&filter.name.as_str()) {
                return Err(ConfigError::UnknownFilterType {
                    flow: flow.name.clone(),
                    filter: filter.name.clone(),
                });
            }
        }
    }

    let mut router_names = HashSet::new();
    for router in &config.router {
        if !router_names.insert(router.name.as_str()) {
            return Err(ConfigError::DuplicateName {
                component: "router",
                name: router.name.clone(),
            });
        }

        let mut check = |flow: &str, site: String| -> Result<()> {
            if !flow.is_empty() && !flow_names.contains(flow) {
                return Err(ConfigError::UnknownFlow {
                    router: site,
                    flow: flow.to_string(),
                });
            }
            Ok(())
        };

        check(&router.default_flow, router.name.clone())?;
        check(&router.tracing_flow, router.name.clone())?;
        for rule in &router.rules {
            for flow in &rule.flow {
                check(flow, format!("{}/{}", router.name, rule.id))?;
            }
        }
    }

    for consumer in &config.queue_consumer {
        if consumer.input_queue.is_empty() {
            return Err(ConfigError::MissingField {
                component: "queue_consumer",
                name: consumer.elasticsearch.clone(),
                field: "input_queue",
            });
        }
        if consumer.elasticsearch.is_empty() {
            return Err(ConfigError::MissingField {
                component: "queue_consumer",
                name: consumer.input_queue.clone(),
                field: "elasticsearch",
            });
        }
    }

    Ok(())
}
