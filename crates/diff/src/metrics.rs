//! Diff pipeline counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by all tasks of one diff pipeline
#[derive(Debug, Default)]
pub struct DiffMetrics {
    /// Input lines skipped because they were not `key,hash`
    pub malformed_lines: AtomicU64,
    /// Keys present only in the source stream
    pub only_in_source: AtomicU64,
    /// Keys present only in the target stream
    pub only_in_target: AtomicU64,
    /// Keys present on both sides with differing hashes
    pub diff_both: AtomicU64,
    /// Items that compared silently equal
    pub equal: AtomicU64,
}

/// Point-in-time diff counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSnapshot {
    pub malformed_lines: u64,
    pub only_in_source: u64,
    pub only_in_target: u64,
    pub diff_both: u64,
    pub equal: u64,
}

impl DiffMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters
    pub fn snapshot(&self) -> DiffSnapshot {
        DiffSnapshot {
            malformed_lines: self.malformed_lines.load(Ordering::Relaxed),
            only_in_source: self.only_in_source.load(Ordering::Relaxed),
            only_in_target: self.only_in_target.load(Ordering::Relaxed),
            diff_both: self.diff_both.load(Ordering::Relaxed),
            equal: self.equal.load(Ordering::Relaxed),
        }
    }
}
