//! Esgate Cluster - Upstream cluster metadata contract
//!
//! The discovery layer that tracks upstream Elasticsearch clusters (health
//! probes, node lists, schema) is an external collaborator. Consumers see
//! it through the [`ClusterMetadata`] trait: availability, the host to
//! dispatch to, the URL schema, and the optional traffic-control budget.
//!
//! [`StaticCluster`] is the fixture implementation for tests and for
//! deployments with a fixed upstream address.

mod fixture;

use serde::Deserialize;

pub use fixture::StaticCluster;

/// Default traffic-control budget when the configured value is not positive
pub const DEFAULT_MAX_WAIT_TIME_MS: u64 = 10_000;

/// Identity of a cluster, used for metric and limiter keying
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Stable id, unique across configured clusters
    pub id: String,

    /// Display name for logs
    pub name: String,
}

/// Per-node dispatch budgets enforced before each upstream request
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct TrafficControl {
    /// Requests per second per node; 0 disables the gate
    pub max_qps_per_node: u64,

    /// Bytes per second per node; 0 disables the gate
    pub max_bytes_per_node: u64,

    /// Budget for limiter gating before a request proceeds ungated
    pub max_wait_time_in_ms: u64,
}

impl TrafficControl {
    /// Gating budget in milliseconds, defaulted when not positive
    pub fn max_wait_time_in_ms(&self) -> u64 {
        if self.max_wait_time_in_ms == 0 {
            DEFAULT_MAX_WAIT_TIME_MS
        } else {
            self.max_wait_time_in_ms
        }
    }
}

/// Read side of the cluster discovery layer
pub trait ClusterMetadata: Send + Sync {
    /// Cluster identity for metric keying
    fn config(&self) -> &ClusterConfig;

    /// Whether the cluster currently accepts traffic
    fn is_available(&self) -> bool;

    /// Host (host:port) to dispatch the next request to
    fn active_host(&self) -> String;

    /// URL schema the cluster speaks
    fn schema(&self) -> Schema;

    /// Traffic-control budgets, if enforcement is configured
    fn traffic_control(&self) -> Option<TrafficControl>;
}

/// URL schema of an upstream cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    #[default]
    Http,
    Https,
}

impl Schema {
    /// Scheme string as it appears in a URL
    pub fn as_str(&self) -> &'static str {
        match self {
            Schema::Http => "http",
            Schema::Https => "https",
        }
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod tests;
