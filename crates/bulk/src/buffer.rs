//! Pooled bulk buffers
//!
//! A [`BulkBuffer`] accumulates re-encoded bulk items and counts logical
//! messages (one action line plus optional source line, each terminated by
//! a single newline). Buffers come from a lock-free [`BulkBufferPool`];
//! ownership transfers from `acquire` to `release` exactly once, and debug
//! builds flag buffers that are dropped while still leased.

use bytes::{BufMut, Bytes, BytesMut};
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Byte buffer counting logical bulk messages
#[derive(Debug, Default)]
pub struct BulkBuffer {
    buf: BytesMut,
    message_count: usize,
    leased: bool,
}

impl BulkBuffer {
    /// Create an unpooled buffer
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Create an unpooled buffer with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            message_count: 0,
            leased: false,
        }
    }

    /// Append one message: the action line, then the source line if present,
    /// each terminated by a single newline
    ///
    /// Line bytes are written exactly as received, so bucket contents
    /// re-encode the original request bytes in original order.
    pub fn append(&mut self, action_line: &[u8], source_line: Option<&[u8]>) {
        self.buf.put_slice(action_line);
        self.buf.put_u8(b'\n');
        if let Some(source) = source_line {
            self.buf.put_slice(source);
            self.buf.put_u8(b'\n');
        }
        self.message_count += 1;
    }

    /// Number of messages appended since the last reset
    #[inline]
    pub fn message_count(&self) -> usize {
        self.message_count
    }

    /// Encoded size in bytes
    #[inline]
    pub fn message_size(&self) -> usize {
        self.buf.len()
    }

    /// The encoded messages
    #[inline]
    pub fn message_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Whether no messages have been appended
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.message_count == 0
    }

    /// Ensure the buffer ends with a newline
    ///
    /// A bulk body must be newline-terminated before it is enqueued;
    /// `append` already terminates every line, so this is normally a no-op.
    pub fn safety_end_with_newline(&mut self) {
        if !self.buf.is_empty() && self.buf.last() != Some(&b'\n') {
            self.buf.put_u8(b'\n');
        }
    }

    /// Copy out the encoded messages
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }

    /// Clear contents and counters, keeping the allocation
    pub fn reset(&mut self) {
        self.buf.clear();
        self.message_count = 0;
    }
}

#[cfg(debug_assertions)]
impl Drop for BulkBuffer {
    fn drop(&mut self) {
        if self.leased {
            tracing::warn!(
                size = self.buf.len(),
                messages = self.message_count,
                "bulk buffer dropped while leased; release it to the pool instead"
            );
        }
    }
}

/// Lock-free pool of reusable bulk buffers
///
/// Pre-allocates buffers at construction; when the pool is exhausted, new
/// buffers are allocated on demand and absorbed on release.
pub struct BulkBufferPool {
    queue: ArrayQueue<BulkBuffer>,
    buffer_capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
}

/// Point-in-time pool counters
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub drops: u64,
}

impl BulkBufferPool {
    /// Pool of `pool_size` buffers of `buffer_capacity` bytes each
    pub fn new(pool_size: usize, buffer_capacity: usize) -> Self {
        let queue = ArrayQueue::new(pool_size.max(1));
        for _ in 0..pool_size {
            let _ = queue.push(BulkBuffer::with_capacity(buffer_capacity));
        }
        Self {
            queue,
            buffer_capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            drops: AtomicU64::new(0),
        }
    }

    /// Take a buffer from the pool, allocating on exhaustion
    pub fn acquire(&self) -> BulkBuffer {
        let mut buf = match self.queue.pop() {
            Some(buf) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                BulkBuffer::with_capacity(self.buffer_capacity)
            }
        };
        buf.leased = true;
        buf
    }

    /// Return a buffer to the pool
    ///
    /// The buffer is reset before pooling. If the pool is full the buffer
    /// is discarded.
    pub fn release(&self, mut buf: BulkBuffer) {
        buf.reset();
        buf.leased = false;
        match self.queue.push(buf) {
            Ok(()) => {
                self.returns.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.drops.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of buffers currently pooled
    pub fn available(&self) -> usize {
        self.queue.len()
    }

    /// Snapshot of pool counters
    pub fn metrics(&self) -> PoolMetricsSnapshot {
        PoolMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod tests;
