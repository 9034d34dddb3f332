//! Compare items and diff records

use serde::{Deserialize, Serialize};

/// One exported document: its key and content hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareItem {
    /// Document key; streams are merged in lexicographic key order
    pub key: String,
    /// Content hash; compared once keys are equal
    pub hash: String,
}

impl CompareItem {
    /// Create a compare item
    pub fn new(key: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            hash: hash.into(),
        }
    }

    /// Parse a `key,hash` line; anything else is `None`
    pub fn parse_line(line: &[u8]) -> Option<Self> {
        let line = std::str::from_utf8(line).ok()?;
        let mut fields = line.split(',').filter(|f| !f.is_empty());
        let key = fields.next()?;
        let hash = fields.next()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self::new(key, hash))
    }
}

/// Which side(s) a diff record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffKind {
    /// Key present in the source stream only
    OnlyInSource,
    /// Key present in the target stream only
    OnlyInTarget,
    /// Key present on both sides with differing hashes
    DiffBoth,
}

/// One emitted difference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    /// Difference category
    #[serde(rename = "type")]
    pub kind: DiffKind,

    /// The differing key
    pub key: String,

    /// Source-side item, embedded when `keep_source` is enabled
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<CompareItem>,

    /// Target-side item, embedded when `keep_source` is enabled
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<CompareItem>,
}

impl DiffRecord {
    /// Record a key present only in the source stream
    pub fn only_in_source(item: CompareItem, keep_items: bool) -> Self {
        Self {
            kind: DiffKind::OnlyInSource,
            key: item.key.clone(),
            source: keep_items.then_some(item),
            target: None,
        }
    }

    /// Record a key present only in the target stream
    pub fn only_in_target(item: CompareItem, keep_items: bool) -> Self {
        Self {
            kind: DiffKind::OnlyInTarget,
            key: item.key.clone(),
            source: None,
            target: keep_items.then_some(item),
        }
    }

    /// Record a key whose hashes disagree
    pub fn diff_both(source: CompareItem, target: CompareItem, keep_items: bool) -> Self {
        Self {
            kind: DiffKind::DiffBoth,
            key: target.key.clone(),
            source: keep_items.then_some(source),
            target: keep_items.then_some(target),
        }
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
