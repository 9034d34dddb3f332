//! Token bucket state for one rate dimension

use std::time::{Duration, Instant};

/// A token bucket refilled continuously over time
///
/// The bucket starts full. Each permitted call consumes tokens; refill is
/// computed lazily from the elapsed time on each check, so an idle bucket
/// costs nothing.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Bucket holding `capacity` tokens, refilled at `capacity` per `interval`
    pub fn new(capacity: u64, interval: Duration) -> Self {
        let secs = interval.as_secs_f64().max(f64::MIN_POSITIVE);
        Self {
            capacity: capacity as f64,
            tokens: capacity as f64,
            refill_per_sec: capacity as f64 / secs,
            last_refill: Instant::now(),
        }
    }

    /// Bucket at per-second granularity: `limit` tokens, `limit`/s refill
    pub fn per_second(limit: u64) -> Self {
        Self::new(limit, Duration::from_secs(1))
    }

    /// Consume one token if available
    pub fn allow(&mut self) -> bool {
        self.allow_n_at(1, Instant::now())
    }

    /// Consume `n` tokens if available
    ///
    /// Requests larger than the bucket capacity can never be satisfied and
    /// are denied outright rather than deadlocking the caller's retry loop.
    pub fn allow_n(&mut self, n: u64) -> bool {
        self.allow_n_at(n, Instant::now())
    }

    pub(crate) fn allow_n_at(&mut self, n: u64, now: Instant) -> bool {
        self.refill(now);

        let wanted = n as f64;
        if wanted > self.capacity {
            return false;
        }
        if self.tokens >= wanted {
            self.tokens -= wanted;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed > Duration::ZERO {
            let added = elapsed.as_secs_f64() * self.refill_per_sec;
            self.tokens = (self.tokens + added).min(self.capacity);
            self.last_refill = now;
        }
    }
}
