//! Tests for the traffic control gate

use std::sync::Arc;
use std::time::Duration;

use esgate_cluster::TrafficControl;
use esgate_rate::LimiterRegistry;
use tokio::time::Instant;

use super::*;
use crate::ConsumerMetrics;

#[tokio::test]
async fn test_no_limits_passes_immediately() {
    let limiters = LimiterRegistry::new();
    let metrics = ConsumerMetrics::new();
    let control = TrafficControl::default();

    let start = Instant::now();
    gate_traffic(&limiters, "c", "h", &control, 100, &metrics).await;
    assert!(start.elapsed() < Duration::from_millis(50));
    assert_eq!(metrics.snapshot().qps_throttled, 0);
}

#[tokio::test]
async fn test_budget_exhaustion_never_deadlocks() {
    // One request per second, ten concurrent dispatches, 50 ms budget:
    // one wins a token, the rest spin in 10 ms cycles until the budget is
    // spent and then proceed ungated.
    let limiters = Arc::new(LimiterRegistry::new());
    let metrics = Arc::new(ConsumerMetrics::new());
    let control = TrafficControl {
        max_qps_per_node: 1,
        max_bytes_per_node: 0,
        max_wait_time_in_ms: 50,
    };

    let mut handles = Vec::new();
    for _ in 0..10 {
        let limiters = Arc::clone(&limiters);
        let metrics = Arc::clone(&metrics);
        handles.push(tokio::spawn(async move {
            gate_traffic(&limiters, "prod", "node1:9200", &control, 1, &metrics).await;
        }));
    }

    let all = async {
        for handle in handles {
            handle.await.unwrap();
        }
    };
    tokio::time::timeout(Duration::from_secs(5), all)
        .await
        .expect("all gated dispatches must complete");

    assert!(metrics.snapshot().qps_throttled > 0);
}

#[tokio::test]
async fn test_bps_gate_counts_request_bytes() {
    let limiters = LimiterRegistry::new();
    let metrics = ConsumerMetrics::new();
    let control = TrafficControl {
        max_qps_per_node: 0,
        max_bytes_per_node: 1000,
        max_wait_time_in_ms: 30,
    };

    // First request drains the byte budget, the second throttles until
    // the budget is exhausted
    gate_traffic(&limiters, "c", "h", &control, 1000, &metrics).await;
    gate_traffic(&limiters, "c", "h", &control, 1000, &metrics).await;

    assert!(metrics.snapshot().bps_throttled > 0);
}

#[tokio::test]
async fn test_token_becomes_available_within_budget() {
    let limiters = LimiterRegistry::new();
    let metrics = ConsumerMetrics::new();
    let control = TrafficControl {
        // 100/s refills a token every 10 ms, well inside the budget
        max_qps_per_node: 100,
        max_bytes_per_node: 0,
        max_wait_time_in_ms: 1000,
    };

    let start = Instant::now();
    for _ in 0..110 {
        gate_traffic(&limiters, "c", "h", &control, 1, &metrics).await;
    }
    // 100 tokens burst + ~10 refilled while throttled
    assert!(start.elapsed() < Duration::from_secs(1));
}
