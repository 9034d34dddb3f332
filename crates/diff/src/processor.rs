//! Partitioned diff pipeline
//!
//! Runs `2 x partition_size` sort-and-feed tasks, `partition_size`
//! comparators and one record sink, then the report phase. File layout:
//!
//! ```text
//! <data_dir>/diff/<queue><partition>            raw key,hash lines
//! <data_dir>/diff/<queue><partition>_sorted     sort phase output
//! <log_dir>/diff_result/<src>_vs_<tgt>/<ts>.log text report
//! ```

use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use esgate_config::DiffConfig;
use esgate_queue::DurableQueue;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::record::CompareItem;
use crate::report::DiffReport;
use crate::sorter::ExternalSorter;
use crate::{merge, DiffError, DiffMetrics, DiffRecord, Result};

/// Quiescence window: one idle pop of this length ends the report phase.
/// Records arriving later are not reported.
const REPORT_IDLE_WINDOW: Duration = Duration::from_secs(5);

/// Compares two partitioned `(key, hash)` streams and reports differences
pub struct IndexDiffProcessor {
    config: DiffConfig,
    queue: Arc<dyn DurableQueue>,
    metrics: Arc<DiffMetrics>,
    report_idle_window: Duration,
}

impl IndexDiffProcessor {
    /// Create a processor over a queue backend
    pub fn new(config: DiffConfig, queue: Arc<dyn DurableQueue>) -> Self {
        Self {
            config,
            queue,
            metrics: Arc::new(DiffMetrics::new()),
            report_idle_window: REPORT_IDLE_WINDOW,
        }
    }

    /// Shrink the quiescence window (tests)
    #[must_use]
    pub fn with_report_idle_window(mut self, window: Duration) -> Self {
        self.report_idle_window = window;
        self
    }

    /// Counters shared by the pipeline tasks
    pub fn metrics(&self) -> Arc<DiffMetrics> {
        Arc::clone(&self.metrics)
    }

    fn partition_file(&self, queue_name: &str, partition: usize) -> PathBuf {
        Path::new(&self.config.data_dir)
            .join("diff")
            .join(format!("{queue_name}{partition}"))
    }

    fn sorted_file(&self, queue_name: &str, partition: usize) -> PathBuf {
        Path::new(&self.config.data_dir)
            .join("diff")
            .join(format!("{queue_name}{partition}_sorted"))
    }

    /// Run sort, merge and report to completion
    pub async fn run(&self) -> Result<()> {
        let buffer = self.config.buffer_size.max(1);
        let (record_tx, mut record_rx) = mpsc::channel::<DiffRecord>(64);

        let mut tasks: JoinSet<Result<()>> = JoinSet::new();
        for partition in 0..self.config.partition_size {
            let (left_tx, left_rx) = mpsc::channel(buffer);
            let (right_tx, right_rx) = mpsc::channel(buffer);

            tasks.spawn(feed_partition(
                self.partition_file(&self.config.source_queue, partition),
                self.sorted_file(&self.config.source_queue, partition),
                left_tx,
                Arc::clone(&self.metrics),
            ));
            tasks.spawn(feed_partition(
                self.partition_file(&self.config.target_queue, partition),
                self.sorted_file(&self.config.target_queue, partition),
                right_tx,
                Arc::clone(&self.metrics),
            ));

            let out = record_tx.clone();
            let keep_items = self.config.keep_source;
            let metrics = Arc::clone(&self.metrics);
            tasks.spawn(async move {
                merge::compare_streams(left_rx, right_rx, out, keep_items, metrics).await;
                Ok(())
            });
        }
        drop(record_tx);

        // Sink: persist every record before the merge is considered done
        while let Some(record) = record_rx.recv().await {
            let payload = serde_json::to_vec(&record).map_err(|e| DiffError::Record(e.to_string()))?;
            self.queue
                .push(&self.config.diff_queue, Bytes::from(payload))
                .await?;
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::error!(error = %error, "diff task failed");
                    first_error.get_or_insert(error);
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "diff task panicked");
                }
            }
        }
        if let Some(error) = first_error {
            return Err(error);
        }

        if self.config.text_report {
            self.write_report().await?;
        }

        tracing::info!(
            source = %self.config.source_queue,
            target = %self.config.target_queue,
            "index diff finished"
        );
        Ok(())
    }

    /// Drain the diff queue into the text report
    ///
    /// One idle pop of the quiescence window means the merge output is
    /// complete; records arriving after that are lost by contract.
    async fn write_report(&self) -> Result<()> {
        let mut report = DiffReport::new();

        loop {
            let popped = self
                .queue
                .pop_timeout(&self.config.diff_queue, self.report_idle_window)
                .await?;
            let Some(payload) = popped.into_payload() else {
                break;
            };
            let record: DiffRecord = serde_json::from_slice(&payload)
                .map_err(|e| DiffError::Record(e.to_string()))?;
            report.add(&record);
        }

        let rendered = report.render();
        println!("{rendered}");

        let dir = Path::new(&self.config.log_dir).join("diff_result").join(format!(
            "{}_vs_{}",
            self.config.source_queue, self.config.target_queue
        ));
        fs::create_dir_all(&dir)?;
        let file = dir.join(format!(
            "{}.log",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ));
        fs::write(&file, rendered)?;
        tracing::info!(file = %file.display(), "diff report written");
        Ok(())
    }
}

/// Sort one partition file (unless already sorted) and feed its items
async fn feed_partition(
    input: PathBuf,
    sorted: PathBuf,
    items: mpsc::Sender<CompareItem>,
    metrics: Arc<DiffMetrics>,
) -> Result<()> {
    {
        let input = input.clone();
        let sorted = sorted.clone();
        tokio::task::spawn_blocking(move || sort_partition(&input, &sorted))
            .await
            .expect("sort task panicked")?;
    }

    let file = tokio::fs::File::open(&sorted).await?;
    let mut reader = tokio::io::BufReader::new(file);
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line).await?;
        if read == 0 {
            return Ok(());
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.is_empty() {
            continue;
        }

        match CompareItem::parse_line(&line) {
            Some(item) => {
                // Receiver gone means the comparator stopped; nothing left to feed
                if items.send(item).await.is_err() {
                    return Ok(());
                }
            }
            None => {
                DiffMetrics::incr(&metrics.malformed_lines);
                tracing::debug!(
                    file = %sorted.display(),
                    line = %String::from_utf8_lossy(&line),
                    "skipping malformed line"
                );
            }
        }
    }
}

/// Produce `<input>_sorted` via external-merge sort
///
/// An existing sorted file is reused as-is; the operator removes it to
/// force a re-sort. A missing input produces an empty sorted file so the
/// merge sees an exhausted stream.
fn sort_partition(input: &Path, sorted: &Path) -> Result<()> {
    if sorted.exists() {
        tracing::warn!(
            file = %sorted.display(),
            "sorted file exists, remove it to re-sort"
        );
        return Ok(());
    }
    if let Some(parent) = sorted.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut sorter = ExternalSorter::new()?;
    if input.exists() {
        let mut reader = BufReader::new(fs::File::open(input)?);
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if !line.is_empty() {
                sorter.append(&line)?;
            }
        }
    } else {
        tracing::debug!(file = %input.display(), "partition input missing, sorted output is empty");
    }

    let mut writer = BufWriter::with_capacity(10 * 1024, fs::File::create(sorted)?);
    for line in sorter.sort()? {
        writer.write_all(&line?)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "processor_test.rs"]
mod tests;
