//! Per-host traffic control gate
//!
//! Before each upstream dispatch the worker gates on the cluster's QPS
//! and BPS limiters. Denials sleep 10 ms and re-check both gates from the
//! top; once the wait budget is spent the request proceeds ungated with a
//! warning, so a mis-sized budget degrades to unthrottled replay instead
//! of a stalled queue.

use std::time::Duration;

use esgate_cluster::TrafficControl;
use esgate_rate::LimiterRegistry;
use tokio::time::Instant;

use crate::ConsumerMetrics;

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Gate one request of `request_bytes` bytes on the cluster's budgets
pub async fn gate_traffic(
    limiters: &LimiterRegistry,
    cluster_id: &str,
    host: &str,
    control: &TrafficControl,
    request_bytes: u64,
    metrics: &ConsumerMetrics,
) {
    let budget = Duration::from_millis(control.max_wait_time_in_ms());
    let start = Instant::now();

    loop {
        if start.elapsed() >= budget {
            tracing::warn!(
                cluster = cluster_id,
                host,
                budget_ms = control.max_wait_time_in_ms(),
                "traffic control wait budget exhausted, dispatching ungated"
            );
            return;
        }

        if control.max_qps_per_node > 0 {
            let qps = limiters.per_second(cluster_id, host, "max_qps", control.max_qps_per_node);
            if !qps.allow() {
                ConsumerMetrics::incr(&metrics.qps_throttled);
                tracing::trace!(cluster = cluster_id, host, "qps throttled");
                tokio::time::sleep(RETRY_INTERVAL).await;
                continue;
            }
        }

        if control.max_bytes_per_node > 0 {
            let bps = limiters.per_second(cluster_id, host, "max_bps", control.max_bytes_per_node);
            if !bps.allow_n(request_bytes) {
                ConsumerMetrics::incr(&metrics.bps_throttled);
                tracing::trace!(cluster = cluster_id, host, "bps throttled");
                tokio::time::sleep(RETRY_INTERVAL).await;
                continue;
            }
        }

        return;
    }
}

#[cfg(test)]
#[path = "throttle_test.rs"]
mod tests;
