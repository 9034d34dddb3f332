//! Cached limiters keyed by scope, key and metric

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::TokenBucket;

/// A shared, thread-safe token bucket
pub struct Limiter {
    bucket: Mutex<TokenBucket>,
}

impl Limiter {
    fn new(bucket: TokenBucket) -> Self {
        Self {
            bucket: Mutex::new(bucket),
        }
    }

    /// Consume one token if available
    pub fn allow(&self) -> bool {
        self.bucket.lock().allow()
    }

    /// Consume `n` tokens if available
    pub fn allow_n(&self, n: u64) -> bool {
        self.bucket.lock().allow_n(n)
    }
}

/// Cache of limiters, created on first use
///
/// The key is `(scope, key, metric)`; upstream gating uses
/// `(cluster id, host, "max_qps")` and `(cluster id, host, "max_bps")`,
/// log throttling uses `("bulk_error", url, "log")`. The limit recorded at
/// first use sticks for the lifetime of the entry.
#[derive(Default)]
pub struct LimiterRegistry {
    limiters: RwLock<HashMap<(String, String, &'static str), Arc<Limiter>>>,
}

impl LimiterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Limiter at `limit` tokens per second
    pub fn per_second(
        &self,
        scope: &str,
        key: &str,
        metric: &'static str,
        limit: u64,
    ) -> Arc<Limiter> {
        self.get_or_create(scope, key, metric, || TokenBucket::per_second(limit))
    }

    /// Limiter at `capacity` tokens per `interval`
    pub fn with_interval(
        &self,
        scope: &str,
        key: &str,
        metric: &'static str,
        capacity: u64,
        interval: Duration,
    ) -> Arc<Limiter> {
        self.get_or_create(scope, key, metric, || TokenBucket::new(capacity, interval))
    }

    fn get_or_create(
        &self,
        scope: &str,
        key: &str,
        metric: &'static str,
        build: impl FnOnce() -> TokenBucket,
    ) -> Arc<Limiter> {
        {
            let limiters = self.limiters.read();
            if let Some(limiter) = limiters.get(&(scope.to_string(), key.to_string(), metric)) {
                return Arc::clone(limiter);
            }
        }

        let mut limiters = self.limiters.write();
        Arc::clone(
            limiters
                .entry((scope.to_string(), key.to_string(), metric))
                .or_insert_with(|| Arc::new(Limiter::new(build()))),
        )
    }

    /// Number of cached limiters
    pub fn len(&self) -> usize {
        self.limiters.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.limiters.read().is_empty()
    }
}
