//! Static cluster metadata
//!
//! A fixed-address implementation of [`ClusterMetadata`] with mutable
//! availability, used by tests and single-upstream deployments.

use parking_lot::RwLock;

use crate::{ClusterConfig, ClusterMetadata, Schema, TrafficControl};

/// Cluster metadata with a fixed host list and toggleable availability
pub struct StaticCluster {
    config: ClusterConfig,
    hosts: Vec<String>,
    schema: Schema,
    traffic_control: Option<TrafficControl>,
    state: RwLock<State>,
}

struct State {
    available: bool,
    next_host: usize,
}

impl StaticCluster {
    /// Create an available cluster with a single host
    pub fn new(id: impl Into<String>, host: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            config: ClusterConfig {
                name: id.clone(),
                id,
            },
            hosts: vec![host.into()],
            schema: Schema::Http,
            traffic_control: None,
            state: RwLock::new(State {
                available: true,
                next_host: 0,
            }),
        }
    }

    /// Use HTTPS when dispatching to this cluster
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Enforce traffic control on this cluster
    #[must_use]
    pub fn with_traffic_control(mut self, tc: TrafficControl) -> Self {
        self.traffic_control = Some(tc);
        self
    }

    /// Additional hosts, rotated round-robin by `active_host`
    #[must_use]
    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        self.hosts = hosts;
        self
    }

    /// Flip availability, e.g. to drive worker-exit tests
    pub fn set_available(&self, available: bool) {
        self.state.write().available = available;
    }
}

impl ClusterMetadata for StaticCluster {
    fn config(&self) -> &ClusterConfig {
        &self.config
    }

    fn is_available(&self) -> bool {
        self.state.read().available
    }

    fn active_host(&self) -> String {
        let mut state = self.state.write();
        let host = self.hosts[state.next_host % self.hosts.len()].clone();
        state.next_host = state.next_host.wrapping_add(1);
        host
    }

    fn schema(&self) -> Schema {
        self.schema
    }

    fn traffic_control(&self) -> Option<TrafficControl> {
        self.traffic_control
    }
}
