//! In-process queue backend
//!
//! FIFO queues held in memory, suitable for tests and single-node runs
//! where durability is provided by an outer store. Waiting consumers park
//! on a per-queue [`Notify`] and re-check under their own deadline, so a
//! pop never spins.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::{DurableQueue, Popped, Result};

#[derive(Default)]
struct QueueState {
    items: Mutex<VecDeque<Bytes>>,
    notify: Notify,
}

/// In-memory many-producer/many-consumer FIFO queues keyed by name
#[derive(Default)]
pub struct MemoryQueue {
    queues: RwLock<HashMap<String, Arc<QueueState>>>,
}

impl MemoryQueue {
    /// Create an empty backend with no queues
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, name: &str) -> Arc<QueueState> {
        if let Some(state) = self.queues.read().get(name) {
            return Arc::clone(state);
        }
        let mut queues = self.queues.write();
        Arc::clone(queues.entry(name.to_string()).or_default())
    }

    /// Drain everything currently queued, oldest first
    ///
    /// Test helper; concurrent pushes racing the drain may be missed.
    pub fn drain(&self, name: &str) -> Vec<Bytes> {
        self.state(name).items.lock().drain(..).collect()
    }
}

#[async_trait]
impl DurableQueue for MemoryQueue {
    async fn push(&self, name: &str, payload: Bytes) -> Result<()> {
        let state = self.state(name);
        state.items.lock().push_back(payload);
        state.notify.notify_one();
        Ok(())
    }

    async fn pop_timeout(&self, name: &str, timeout: Duration) -> Result<Popped> {
        let state = self.state(name);
        let deadline = Instant::now() + timeout;

        loop {
            // Register interest before checking, otherwise a push landing
            // between the check and the await is missed.
            let notified = state.notify.notified();

            if let Some(item) = state.items.lock().pop_front() {
                return Ok(Popped::Payload(item));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(Popped::TimedOut);
            }
            let _ = tokio::time::timeout(remaining, notified).await;
        }
    }

    async fn depth(&self, name: &str) -> Result<u64> {
        Ok(self.state(name).items.lock().len() as u64)
    }

    async fn ensure_queue(&self, name: &str) -> Result<()> {
        let _ = self.state(name);
        Ok(())
    }
}
