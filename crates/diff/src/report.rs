//! Human-readable diff report

use crate::{DiffKind, DiffRecord};

const BANNER: &str = "\
===============================================\n\
              Index Diff Result\n\
===============================================\n";

/// Aggregated diff records, rendered per category
#[derive(Debug, Default)]
pub struct DiffReport {
    only_in_source: Vec<String>,
    only_in_target: Vec<String>,
    diff_both: Vec<String>,
}

impl DiffReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record to its category listing
    pub fn add(&mut self, record: &DiffRecord) {
        match record.kind {
            DiffKind::OnlyInSource => {
                let hash = record.source.as_ref().map(|i| i.hash.as_str());
                self.only_in_source.push(doc_line(&record.key, hash));
            }
            DiffKind::OnlyInTarget => {
                let hash = record.target.as_ref().map(|i| i.hash.as_str());
                self.only_in_target.push(doc_line(&record.key, hash));
            }
            DiffKind::DiffBoth => {
                let line = match (&record.source, &record.target) {
                    (Some(source), Some(target)) => format!(
                        "doc:{}, hash:{} vs {}",
                        record.key, source.hash, target.hash
                    ),
                    _ => format!("doc:{}", record.key),
                };
                self.diff_both.push(line);
            }
        }
    }

    /// Whether no difference was recorded
    pub fn is_consistent(&self) -> bool {
        self.only_in_source.is_empty()
            && self.only_in_target.is_empty()
            && self.diff_both.is_empty()
    }

    /// Number of records per category: (source-only, target-only, both)
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.only_in_source.len(),
            self.only_in_target.len(),
            self.diff_both.len(),
        )
    }

    /// Render the banner, the non-empty category sections and the
    /// consistency verdict
    pub fn render(&self) -> String {
        let mut out = String::from(BANNER);

        if !self.only_in_source.is_empty() {
            out.push_str(&format!(
                "\n{} documents only exist in source:\n",
                self.only_in_source.len()
            ));
            for line in &self.only_in_source {
                out.push_str(line);
                out.push('\n');
            }
        }
        if !self.only_in_target.is_empty() {
            out.push_str(&format!(
                "\n{} documents only exist in target:\n",
                self.only_in_target.len()
            ));
            for line in &self.only_in_target {
                out.push_str(line);
                out.push('\n');
            }
        }
        if !self.diff_both.is_empty() {
            out.push_str(&format!(
                "\n{} documents exist on both sides but differ:\n",
                self.diff_both.len()
            ));
            for line in &self.diff_both {
                out.push_str(line);
                out.push('\n');
            }
        }

        if self.is_consistent() {
            out.push_str("\nCongratulations, the two clusters are consistent!\n");
        }
        out
    }
}

fn doc_line(key: &str, hash: Option<&str>) -> String {
    match hash {
        Some(hash) => format!("doc:{key}, hash:{hash}"),
        None => format!("doc:{key}"),
    }
}
