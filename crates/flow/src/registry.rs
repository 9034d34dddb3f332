//! Filter registry and flow materialization
//!
//! The registry is an explicit value constructed at startup and handed to
//! the listener; nothing here is process-global, so tests build isolated
//! registries. It holds four name mappings (filter factories, flow
//! configs, router configs, rule configs) plus the memoized flows
//! materialized from them.
//!
//! Registration happens during startup; afterwards the registry is
//! effectively read-only and lock contention is limited to the first
//! materialization of each flow.

use std::collections::HashMap;
use std::sync::Arc;

use esgate_config::{Config, FilterConfig, FlowConfig, RouterConfig, RuleConfig};
use esgate_queue::DurableQueue;
use esgate_rate::LimiterRegistry;
use esgate_routing::RouteTable;
use parking_lot::RwLock;

use crate::{FilterFlow, FlowError, RequestContext, Result};

/// Shared services handed to filters at construction
#[derive(Clone)]
pub struct FlowServices {
    /// Durable queue backend for failure/invalid/success routing
    pub queue: Arc<dyn DurableQueue>,

    /// Token-bucket cache, also used for log throttling
    pub limiters: Arc<LimiterRegistry>,

    /// Shared pool for bulk re-encoding buffers
    pub bulk_buffers: Arc<esgate_bulk::BulkBufferPool>,
}

impl FlowServices {
    /// Create services around a queue backend with default pool sizing
    pub fn new(queue: Arc<dyn DurableQueue>) -> Self {
        Self {
            queue,
            limiters: Arc::new(LimiterRegistry::new()),
            bulk_buffers: Arc::new(esgate_bulk::BulkBufferPool::new(64, 64 * 1024)),
        }
    }
}

/// Factory creating filter instances from configuration
///
/// Each filter type publishes a constructor that accepts the parameter
/// table explicitly; the registry stores constructors, not prototypes.
pub trait FilterFactory: Send + Sync {
    /// Type name used in flow configs
    fn name(&self) -> &'static str;

    /// Build a filter instance
    ///
    /// The registry is available for resolving sub-flows (e.g. a retry
    /// flow); implementations must not hold on to it.
    fn create(
        &self,
        config: &FilterConfig,
        registry: &Registry,
    ) -> Result<Arc<dyn crate::Filter>>;
}

/// Process-wide registry of filters, flows and routers
pub struct Registry {
    services: FlowServices,
    factories: RwLock<HashMap<String, Arc<dyn FilterFactory>>>,
    flow_configs: RwLock<HashMap<String, FlowConfig>>,
    router_configs: RwLock<HashMap<String, RouterConfig>>,
    rule_configs: RwLock<HashMap<String, RuleConfig>>,
    flows: RwLock<HashMap<String, Arc<FilterFlow>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new(services: FlowServices) -> Self {
        Self {
            services,
            factories: RwLock::new(HashMap::new()),
            flow_configs: RwLock::new(HashMap::new()),
            router_configs: RwLock::new(HashMap::new()),
            rule_configs: RwLock::new(HashMap::new()),
            flows: RwLock::new(HashMap::new()),
        }
    }

    /// Shared services for filter construction
    pub fn services(&self) -> &FlowServices {
        &self.services
    }

    /// Install a filter factory under its type name
    ///
    /// # Panics
    /// Panics on duplicate registration; filter names are globally unique.
    pub fn register_filter(&self, factory: Arc<dyn FilterFactory>) {
        let name = factory.name();
        let mut factories = self.factories.write();
        if factories.contains_key(name) {
            panic!("filter factory '{name}' already registered");
        }
        tracing::trace!(filter = name, "register filter");
        factories.insert(name.to_string(), factory);
    }

    /// Install a flow configuration under its name
    pub fn register_flow_config(&self, config: FlowConfig) {
        self.flow_configs.write().insert(config.name.clone(), config);
    }

    /// Install a router configuration and its rules
    pub fn register_router_config(&self, config: RouterConfig) {
        for rule in &config.rules {
            self.register_routing_rule(rule.clone());
        }
        self.router_configs
            .write()
            .insert(config.name.clone(), config);
    }

    /// Install a routing rule under its id
    pub fn register_routing_rule(&self, rule: RuleConfig) {
        self.rule_configs.write().insert(rule.id.clone(), rule);
    }

    /// Register every flow and router of a parsed config
    pub fn load_config(&self, config: &Config) {
        for flow in &config.flow {
            self.register_flow_config(flow.clone());
        }
        for router in &config.router {
            self.register_router_config(router.clone());
        }
    }

    /// Registered filter type names, for config validation
    pub fn known_filter_types(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }

    /// Look up a routing rule by id
    pub fn get_rule(&self, id: &str) -> Result<RuleConfig> {
        self.rule_configs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| FlowError::RuleNotFound(id.to_string()))
    }

    /// Look up a router by name
    pub fn get_router(&self, name: &str) -> Result<RouteTable> {
        self.router_configs
            .read()
            .get(name)
            .cloned()
            .map(RouteTable::new)
            .ok_or_else(|| FlowError::RouterNotFound(name.to_string()))
    }

    /// The materialized flow for an id, building and memoizing on first use
    ///
    /// Materialization instantiates each configured filter through its
    /// factory. No lock is held across factory calls, so factories may
    /// resolve sub-flows recursively.
    pub fn must_get_flow(&self, id: &str) -> Result<Arc<FilterFlow>> {
        if let Some(flow) = self.flows.read().get(id) {
            return Ok(Arc::clone(flow));
        }

        let config = self
            .flow_configs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| FlowError::FlowNotFound(id.to_string()))?;

        let mut flow = FilterFlow::new(id);
        for filter_config in &config.filters {
            flow.join_filter(self.create_filter(filter_config)?);
        }

        let flow = Arc::new(flow);
        let mut flows = self.flows.write();
        // A racing materialization may have won; keep the first.
        Ok(Arc::clone(
            flows.entry(id.to_string()).or_insert(flow),
        ))
    }

    fn create_filter(&self, config: &FilterConfig) -> Result<Arc<dyn crate::Filter>> {
        let factory = self
            .factories
            .read()
            .get(&config.name)
            .cloned()
            .ok_or_else(|| FlowError::FilterNotFound(config.name.clone()))?;
        factory.create(config, self)
    }

    /// A transient flow concatenating the referenced flows' filters
    pub fn join_flows<S: AsRef<str>>(&self, ids: &[S]) -> Result<FilterFlow> {
        let mut joined = FilterFlow::new("");
        for id in ids {
            let flow = self.must_get_flow(id.as_ref())?;
            joined.join_flow(&flow);
        }
        Ok(joined)
    }

    /// Route a context through the named router and run the resolved chain
    ///
    /// A resolved flow id with no configuration fails the context with an
    /// invalid-configuration error.
    pub async fn dispatch(&self, router_name: &str, ctx: &mut RequestContext) -> Result<()> {
        let router = self.get_router(router_name)?;
        let resolution = router.resolve(&ctx.request.method, ctx.request.path());

        let flow = match self.join_flows(&resolution.flows) {
            Ok(flow) => flow,
            Err(error) => {
                ctx.set_failed();
                return Err(FlowError::invalid_configuration(format!(
                    "router '{router_name}' resolved to an unknown flow: {error}"
                )));
            }
        };

        tracing::debug!(
            router = router_name,
            rule = resolution.rule_id.as_deref().unwrap_or("<default>"),
            flow = %flow,
            "dispatching request"
        );
        flow.process(ctx).await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
