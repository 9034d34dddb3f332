//! Consumer counters
//!
//! Lightweight atomics sampled by the operator surface; no external
//! metrics pipeline is involved.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by all workers of one consumer
#[derive(Debug, Default)]
pub struct ConsumerMetrics {
    /// Payloads popped from the input queue
    pub popped: AtomicU64,
    /// Requests replayed upstream
    pub replayed: AtomicU64,
    /// Terminal successes (2xx and 404)
    pub succeeded: AtomicU64,
    /// Payloads pushed to the failure queue
    pub failures_enqueued: AtomicU64,
    /// Payloads pushed to the invalid queue
    pub invalid_enqueued: AtomicU64,
    /// Bulk partial-success bodies persisted
    pub partial_success_enqueued: AtomicU64,
    /// Replay envelopes that failed to decode
    pub decode_failures: AtomicU64,
    /// Requests throttled on the per-host QPS gate
    pub qps_throttled: AtomicU64,
    /// Requests throttled on the per-host BPS gate
    pub bps_throttled: AtomicU64,
}

/// Point-in-time consumer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerSnapshot {
    pub popped: u64,
    pub replayed: u64,
    pub succeeded: u64,
    pub failures_enqueued: u64,
    pub invalid_enqueued: u64,
    pub partial_success_enqueued: u64,
    pub decode_failures: u64,
    pub qps_throttled: u64,
    pub bps_throttled: u64,
}

impl ConsumerMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters
    pub fn snapshot(&self) -> ConsumerSnapshot {
        ConsumerSnapshot {
            popped: self.popped.load(Ordering::Relaxed),
            replayed: self.replayed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failures_enqueued: self.failures_enqueued.load(Ordering::Relaxed),
            invalid_enqueued: self.invalid_enqueued.load(Ordering::Relaxed),
            partial_success_enqueued: self.partial_success_enqueued.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            qps_throttled: self.qps_throttled.load(Ordering::Relaxed),
            bps_throttled: self.bps_throttled.load(Ordering::Relaxed),
        }
    }
}
