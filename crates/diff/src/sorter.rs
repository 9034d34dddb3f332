//! External-merge sort over raw lines
//!
//! Lines are buffered in memory up to a run budget, spilled to sorted run
//! files in a temporary directory, and merged k-way through a min-heap.
//! Inputs smaller than one run never touch the spill directory.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use tempfile::TempDir;

const DEFAULT_RUN_BYTES: usize = 16 * 1024 * 1024;

/// Sorts arbitrarily large line sets within a fixed memory budget
pub struct ExternalSorter {
    run_limit: usize,
    current: Vec<Vec<u8>>,
    current_bytes: usize,
    runs: Vec<PathBuf>,
    spill_dir: TempDir,
}

impl ExternalSorter {
    /// Create a sorter with the default in-memory run budget
    pub fn new() -> io::Result<Self> {
        Self::with_run_limit(DEFAULT_RUN_BYTES)
    }

    /// Create a sorter spilling after `run_limit` buffered bytes
    pub fn with_run_limit(run_limit: usize) -> io::Result<Self> {
        Ok(Self {
            run_limit: run_limit.max(1),
            current: Vec::new(),
            current_bytes: 0,
            runs: Vec::new(),
            spill_dir: tempfile::tempdir()?,
        })
    }

    /// Buffer one line, spilling a sorted run when over budget
    pub fn append(&mut self, line: &[u8]) -> io::Result<()> {
        self.current_bytes += line.len();
        self.current.push(line.to_vec());
        if self.current_bytes >= self.run_limit {
            self.spill()?;
        }
        Ok(())
    }

    /// Number of sorted runs spilled so far
    pub fn spilled_runs(&self) -> usize {
        self.runs.len()
    }

    fn spill(&mut self) -> io::Result<()> {
        if self.current.is_empty() {
            return Ok(());
        }
        self.current.sort_unstable();

        let path = self.spill_dir.path().join(format!("run{}", self.runs.len()));
        let mut writer = BufWriter::new(File::create(&path)?);
        for line in self.current.drain(..) {
            writer.write_all(&line)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        self.current_bytes = 0;
        self.runs.push(path);
        Ok(())
    }

    /// Finish and iterate all lines in non-decreasing order
    pub fn sort(mut self) -> io::Result<SortedLines> {
        self.current.sort_unstable();
        let mut memory: std::collections::VecDeque<Vec<u8>> =
            std::mem::take(&mut self.current).into();

        let mut readers = Vec::with_capacity(self.runs.len());
        for path in &self.runs {
            readers.push(BufReader::new(File::open(path)?));
        }

        // Seed the heap with each run's head; index runs.len() is the
        // in-memory run.
        let mut heap = BinaryHeap::new();
        for (idx, reader) in readers.iter_mut().enumerate() {
            if let Some(line) = read_line(reader)? {
                heap.push(Reverse((line, idx)));
            }
        }
        let memory_idx = readers.len();
        if let Some(line) = memory.pop_front() {
            heap.push(Reverse((line, memory_idx)));
        }

        Ok(SortedLines {
            readers,
            memory,
            heap,
            // Keep the spill directory alive until iteration finishes
            _spill_dir: self.spill_dir,
        })
    }
}

/// Merged, ordered line iterator over all runs
pub struct SortedLines {
    readers: Vec<BufReader<File>>,
    memory: std::collections::VecDeque<Vec<u8>>,
    heap: BinaryHeap<Reverse<(Vec<u8>, usize)>>,
    _spill_dir: TempDir,
}

impl Iterator for SortedLines {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse((line, idx)) = self.heap.pop()?;

        let refill = if idx == self.readers.len() {
            Ok(self.memory.pop_front())
        } else {
            read_line(&mut self.readers[idx])
        };
        match refill {
            Ok(Some(next)) => self.heap.push(Reverse((next, idx))),
            Ok(None) => {}
            Err(e) => return Some(Err(e)),
        }

        Some(Ok(line))
    }
}

fn read_line(reader: &mut BufReader<File>) -> io::Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let read = reader.read_until(b'\n', &mut line)?;
    if read == 0 {
        return Ok(None);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    Ok(Some(line))
}

#[cfg(test)]
#[path = "sorter_test.rs"]
mod tests;
