//! Tests for cluster metadata fixtures

use super::*;

#[test]
fn test_static_cluster_defaults() {
    let cluster = StaticCluster::new("prod", "127.0.0.1:9200");

    assert!(cluster.is_available());
    assert_eq!(cluster.config().id, "prod");
    assert_eq!(cluster.active_host(), "127.0.0.1:9200");
    assert_eq!(cluster.schema(), Schema::Http);
    assert!(cluster.traffic_control().is_none());
}

#[test]
fn test_availability_toggle() {
    let cluster = StaticCluster::new("prod", "127.0.0.1:9200");

    cluster.set_available(false);
    assert!(!cluster.is_available());
    cluster.set_available(true);
    assert!(cluster.is_available());
}

#[test]
fn test_host_rotation() {
    let cluster = StaticCluster::new("prod", "a:9200")
        .with_hosts(vec!["a:9200".to_string(), "b:9200".to_string()]);

    assert_eq!(cluster.active_host(), "a:9200");
    assert_eq!(cluster.active_host(), "b:9200");
    assert_eq!(cluster.active_host(), "a:9200");
}

#[test]
fn test_traffic_control_wait_default() {
    let tc = TrafficControl {
        max_qps_per_node: 100,
        max_bytes_per_node: 0,
        max_wait_time_in_ms: 0,
    };
    assert_eq!(tc.max_wait_time_in_ms(), DEFAULT_MAX_WAIT_TIME_MS);

    let tc = TrafficControl {
        max_wait_time_in_ms: 50,
        ..tc
    };
    assert_eq!(tc.max_wait_time_in_ms(), 50);
}

#[test]
fn test_schema_display() {
    assert_eq!(Schema::Http.to_string(), "http");
    assert_eq!(Schema::Https.as_str(), "https");
}
