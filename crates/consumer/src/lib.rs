//! Esgate Consumer - Disk-queue replay pipeline
//!
//! Requests persisted by the gateway's filters are drained by a pool of
//! workers, replayed against their target cluster under per-host traffic
//! control, and re-classified from the response:
//!
//! - network failure, 429 or 5xx: back onto the failure queue
//! - other 4xx: dead-lettered onto the invalid queue
//! - 2xx on a `_bulk` path: partitioned per item through the bulk codec,
//!   buckets routed to the invalid / failure / partial-success queues
//! - 404: terminal success (the resource is gone; replaying cannot help)
//!
//! Workers poll cancellation and cluster availability at the top of every
//! iteration and exit on either. A queue push failure is fatal: the worker
//! cancels the pool and stops, since dropping a payload would lose data.

mod consumer;
mod error;
mod metrics;
mod throttle;
mod upstream;

pub use consumer::DiskQueueConsumer;
pub use error::{ConsumerError, Result};
pub use metrics::{ConsumerMetrics, ConsumerSnapshot};
pub use throttle::gate_traffic;
pub use upstream::{HttpUpstream, Upstream, UpstreamError, UpstreamResponse};
