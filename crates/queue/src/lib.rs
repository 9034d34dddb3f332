//! Esgate Queue - Durable queue contract
//!
//! Persisted failure handling runs through named FIFO queues: filters push
//! re-encoded bulk buckets, the disk-queue consumer drains and replays
//! them. The storage engine itself lives behind the [`DurableQueue`] trait;
//! this crate ships the contract plus an in-process implementation used by
//! tests and single-node runs.
//!
//! # Design
//!
//! - **Named queues**: every operation takes the queue name; queues are
//!   created on first use
//! - **Multi-producer / multi-consumer**: pushes and pops may come from any
//!   task concurrently
//! - **Timed pop**: `pop_timeout` parks the caller until a payload arrives
//!   or the timeout fires, so consumers can poll cancellation at a bounded
//!   cadence

mod error;
mod memory;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

pub use error::{QueueError, Result};
pub use memory::MemoryQueue;

/// Outcome of a timed pop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popped {
    /// A payload arrived
    Payload(Bytes),
    /// The timeout expired with the queue still empty
    TimedOut,
}

impl Popped {
    /// The payload, if one arrived
    pub fn into_payload(self) -> Option<Bytes> {
        match self {
            Popped::Payload(b) => Some(b),
            Popped::TimedOut => None,
        }
    }

    /// Whether the pop timed out
    pub fn timed_out(&self) -> bool {
        matches!(self, Popped::TimedOut)
    }
}

/// Ordered, durable, many-producer/many-consumer queue keyed by name
#[async_trait]
pub trait DurableQueue: Send + Sync {
    /// Append a payload to the named queue
    async fn push(&self, name: &str, payload: Bytes) -> Result<()>;

    /// Pop the oldest payload, waiting up to `timeout` for one to arrive
    async fn pop_timeout(&self, name: &str, timeout: Duration) -> Result<Popped>;

    /// Number of payloads currently queued
    async fn depth(&self, name: &str) -> Result<u64>;

    /// Create the named queue if it does not exist yet
    ///
    /// Push and pop do this implicitly; callers that want a queue to show
    /// up in depth accounting before first use call this explicitly.
    async fn ensure_queue(&self, name: &str) -> Result<()>;
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
