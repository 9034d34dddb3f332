//! End-to-end tests for the diff pipeline

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use esgate_config::DiffConfig;
use esgate_queue::MemoryQueue;

use super::*;
use crate::{DiffKind, DiffRecord};

struct Fixture {
    _dirs: tempfile::TempDir,
    config: DiffConfig,
    queue: Arc<MemoryQueue>,
}

fn fixture(partitions: usize) -> Fixture {
    let dirs = tempfile::tempdir().unwrap();
    let data_dir = dirs.path().join("data");
    let log_dir = dirs.path().join("log");
    fs::create_dir_all(data_dir.join("diff")).unwrap();

    let config = DiffConfig {
        partition_size: partitions,
        buffer_size: 1,
        data_dir: data_dir.display().to_string(),
        log_dir: log_dir.display().to_string(),
        ..DiffConfig::default()
    };
    Fixture {
        _dirs: dirs,
        config,
        queue: Arc::new(MemoryQueue::new()),
    }
}

impl Fixture {
    fn write_partition(&self, queue_name: &str, partition: usize, lines: &[&str]) {
        let path = std::path::Path::new(&self.config.data_dir)
            .join("diff")
            .join(format!("{queue_name}{partition}"));
        fs::write(path, lines.join("\n") + "\n").unwrap();
    }

    fn processor(&self) -> IndexDiffProcessor {
        IndexDiffProcessor::new(self.config.clone(), Arc::clone(&self.queue) as _)
            .with_report_idle_window(Duration::from_millis(100))
    }

    fn sorted_lines(&self, queue_name: &str, partition: usize) -> Vec<String> {
        let path = std::path::Path::new(&self.config.data_dir)
            .join("diff")
            .join(format!("{queue_name}{partition}_sorted"));
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn report_files(&self) -> Vec<std::path::PathBuf> {
        let dir = std::path::Path::new(&self.config.log_dir)
            .join("diff_result")
            .join(format!(
                "{}_vs_{}",
                self.config.source_queue, self.config.target_queue
            ));
        match fs::read_dir(dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[tokio::test]
async fn test_single_partition_end_to_end() {
    let fixture = fixture(1);
    // Unsorted on purpose: the sort phase orders them
    fixture.write_partition("source", 0, &["c,H3", "a,H1", "d,H4"]);
    fixture.write_partition("target", 0, &["d,H4", "b,H2", "c,H3x"]);

    let processor = fixture.processor();
    processor.run().await.unwrap();

    // Sorted files are non-decreasing permutations of the inputs
    assert_eq!(fixture.sorted_lines("source", 0), vec!["a,H1", "c,H3", "d,H4"]);
    assert_eq!(fixture.sorted_lines("target", 0), vec!["b,H2", "c,H3x", "d,H4"]);

    let snapshot = processor.metrics().snapshot();
    assert_eq!(snapshot.only_in_source, 1);
    assert_eq!(snapshot.only_in_target, 1);
    assert_eq!(snapshot.diff_both, 1);
    assert_eq!(snapshot.equal, 1);

    // The report was written and names every differing key
    let reports = fixture.report_files();
    assert_eq!(reports.len(), 1);
    let rendered = fs::read_to_string(&reports[0]).unwrap();
    assert!(rendered.contains("doc:a, hash:H1"));
    assert!(rendered.contains("doc:b, hash:H2"));
    assert!(rendered.contains("doc:c, hash:H3 vs H3x"));
    assert!(!rendered.contains("doc:d"));
}

#[tokio::test]
async fn test_consistent_clusters() {
    let fixture = fixture(1);
    fixture.write_partition("source", 0, &["a,H1", "b,H2"]);
    fixture.write_partition("target", 0, &["a,H1", "b,H2"]);

    fixture.processor().run().await.unwrap();

    let reports = fixture.report_files();
    let rendered = fs::read_to_string(&reports[0]).unwrap();
    assert!(rendered.contains("the two clusters are consistent"));
}

#[tokio::test]
async fn test_records_persisted_to_diff_queue_without_report() {
    let mut fixture = fixture(1);
    fixture.config.text_report = false;
    fixture.write_partition("source", 0, &["a,H1"]);
    fixture.write_partition("target", 0, &["a,H2"]);

    fixture.processor().run().await.unwrap();

    let payloads = fixture.queue.drain("diff_result");
    assert_eq!(payloads.len(), 1);
    let record: DiffRecord = serde_json::from_slice(&payloads[0]).unwrap();
    assert_eq!(record.kind, DiffKind::DiffBoth);
    assert_eq!(record.key, "a");
    assert!(fixture.report_files().is_empty());
}

#[tokio::test]
async fn test_malformed_lines_are_counted_and_skipped() {
    let fixture = fixture(1);
    fixture.write_partition("source", 0, &["a,H1", "garbage", "b,H2", "x,y,z"]);
    fixture.write_partition("target", 0, &["a,H1", "b,H2"]);

    let processor = fixture.processor();
    processor.run().await.unwrap();

    let snapshot = processor.metrics().snapshot();
    assert_eq!(snapshot.malformed_lines, 2);
    assert_eq!(snapshot.equal, 2);
    assert_eq!(snapshot.only_in_source, 0);
}

#[tokio::test]
async fn test_multiple_partitions_are_independent() {
    let fixture = fixture(2);
    fixture.write_partition("source", 0, &["a,H1"]);
    fixture.write_partition("target", 0, &["a,H1"]);
    fixture.write_partition("source", 1, &["z,H9"]);
    fixture.write_partition("target", 1, &[]);

    let processor = fixture.processor();
    processor.run().await.unwrap();

    let snapshot = processor.metrics().snapshot();
    assert_eq!(snapshot.equal, 1);
    assert_eq!(snapshot.only_in_source, 1);
}

#[tokio::test]
async fn test_missing_partition_files_produce_empty_streams() {
    let fixture = fixture(1);
    // No input files at all: both sides are empty, clusters consistent
    fixture.processor().run().await.unwrap();

    let reports = fixture.report_files();
    let rendered = fs::read_to_string(&reports[0]).unwrap();
    assert!(rendered.contains("consistent"));
}

#[tokio::test]
async fn test_existing_sorted_file_is_reused() {
    let fixture = fixture(1);
    fixture.write_partition("source", 0, &["zzz,H1"]);
    // A pre-existing sorted file wins over the raw input
    fixture.write_partition("target", 0, &["ignored,H0"]);
    let sorted = std::path::Path::new(&fixture.config.data_dir)
        .join("diff")
        .join("target0_sorted");
    fs::write(&sorted, "zzz,H1\n").unwrap();

    let processor = fixture.processor();
    processor.run().await.unwrap();

    assert_eq!(processor.metrics().snapshot().equal, 1);
    // The raw target input was never re-sorted
    assert_eq!(fs::read_to_string(sorted).unwrap(), "zzz,H1\n");
}
