//! Esgate Rate - Token-bucket rate limiting
//!
//! Per-node traffic control and log throttling both gate on token buckets.
//! Buckets are cached in a [`LimiterRegistry`] keyed by
//! `(scope, key, metric)` - for upstream gating that is
//! `(cluster id, host, "max_qps" | "max_bps")` - and created on first use.
//!
//! # Design
//!
//! - **Per-second granularity**: a `per_second(limit)` bucket holds at most
//!   `limit` tokens and refills at `limit` tokens per second
//! - **Non-blocking**: `allow`/`allow_n` never sleep; callers own their
//!   retry cadence
//! - **Concurrent**: the registry is a read-mostly cache; each limiter
//!   serializes its own bucket behind a short-lived lock

mod bucket;
mod registry;

pub use bucket::TokenBucket;
pub use registry::{Limiter, LimiterRegistry};

#[cfg(test)]
#[path = "rate_test.rs"]
mod tests;
