//! Two-pointer stream comparison
//!
//! Walks the heads of two key-ordered streams. The smaller key is a
//! one-sided diff; equal keys compare hashes and advance both sides. A
//! stream ending early leaves the other side draining into one-sided
//! diffs, so every input key is accounted for before the comparator
//! returns.

use std::cmp::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{CompareItem, DiffMetrics, DiffRecord};

/// Compare two sorted streams, sending a record per difference
///
/// Returns once both streams are exhausted and fully drained. Silently
/// equal pairs are only counted.
pub(crate) async fn compare_streams(
    mut source: mpsc::Receiver<CompareItem>,
    mut target: mpsc::Receiver<CompareItem>,
    out: mpsc::Sender<DiffRecord>,
    keep_items: bool,
    metrics: Arc<DiffMetrics>,
) {
    let mut left = source.recv().await;
    let mut right = target.recv().await;

    loop {
        match (left.take(), right.take()) {
            (None, None) => return,
            (Some(a), None) => {
                DiffMetrics::incr(&metrics.only_in_source);
                if out
                    .send(DiffRecord::only_in_source(a, keep_items))
                    .await
                    .is_err()
                {
                    return;
                }
                left = source.recv().await;
            }
            (None, Some(b)) => {
                DiffMetrics::incr(&metrics.only_in_target);
                if out
                    .send(DiffRecord::only_in_target(b, keep_items))
                    .await
                    .is_err()
                {
                    return;
                }
                right = target.recv().await;
            }
            (Some(a), Some(b)) => match a.key.cmp(&b.key) {
                Ordering::Less => {
                    DiffMetrics::incr(&metrics.only_in_source);
                    if out
                        .send(DiffRecord::only_in_source(a, keep_items))
                        .await
                        .is_err()
                    {
                        return;
                    }
                    left = source.recv().await;
                    right = Some(b);
                }
                Ordering::Greater => {
                    DiffMetrics::incr(&metrics.only_in_target);
                    if out
                        .send(DiffRecord::only_in_target(b, keep_items))
                        .await
                        .is_err()
                    {
                        return;
                    }
                    left = Some(a);
                    right = target.recv().await;
                }
                Ordering::Equal => {
                    if a.hash != b.hash {
                        DiffMetrics::incr(&metrics.diff_both);
                        if out
                            .send(DiffRecord::diff_both(a, b, keep_items))
                            .await
                            .is_err()
                        {
                            return;
                        }
                    } else {
                        DiffMetrics::incr(&metrics.equal);
                    }
                    left = source.recv().await;
                    right = target.recv().await;
                }
            },
        }
    }
}

#[cfg(test)]
#[path = "merge_test.rs"]
mod tests;
