//! Esgate Diff - Cross-cluster consistency verification
//!
//! Two document streams - `(key, hash)` records exported from a source and
//! a target cluster - are compared partition by partition:
//!
//! 1. **Sort**: each partition's raw `key,hash` file is run through an
//!    external-merge sort into a `<name>_sorted` sibling (existing sorted
//!    files are reused, not overwritten)
//! 2. **Merge**: two reader tasks feed bounded channels; a comparator
//!    walks both heads two-pointer style and emits a diff record for keys
//!    present on one side only or hashing differently on both
//! 3. **Report**: once the merge is quiescent, per-category listings are
//!    written to a timestamped log file and stdout
//!
//! Malformed input lines are skipped and counted; the count surfaces in
//! [`DiffMetrics`].

mod error;
mod merge;
mod metrics;
mod processor;
mod record;
mod report;
mod sorter;

pub use error::{DiffError, Result};
pub use metrics::{DiffMetrics, DiffSnapshot};
pub use processor::IndexDiffProcessor;
pub use record::{CompareItem, DiffKind, DiffRecord};
pub use report::DiffReport;
pub use sorter::ExternalSorter;
