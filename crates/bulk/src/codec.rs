//! Bulk request splitting
//!
//! Walks the newline-delimited request body and pairs every action line
//! with its source line (absent for deletes). Line bytes are kept as
//! zero-copy slices of the original body so buckets re-encode exactly what
//! was received.

use bytes::Bytes;
use serde_json::Value;

use crate::{BulkError, Result};

/// Bulk action verb from the action line's single key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Index,
    Create,
    Update,
    Delete,
}

impl ActionKind {
    /// The key as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Index => "index",
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "index" => Some(ActionKind::Index),
            "create" => Some(ActionKind::Create),
            "update" => Some(ActionKind::Update),
            "delete" => Some(ActionKind::Delete),
            _ => None,
        }
    }

    /// Whether this action carries a source line
    pub fn has_source(&self) -> bool {
        !matches!(self, ActionKind::Delete)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical request item: action metadata plus original line bytes
#[derive(Debug, Clone)]
pub struct RequestItem {
    /// Action verb
    pub action: ActionKind,
    /// `_index` from the action metadata, if present
    pub index: Option<String>,
    /// `_id` from the action metadata, if present
    pub id: Option<String>,
    /// Exact action line bytes, newline excluded
    pub action_line: Bytes,
    /// Exact source line bytes, newline excluded
    pub source_line: Option<Bytes>,
    /// Zero-based position in the request
    pub ordinal: usize,
}

impl RequestItem {
    /// Encoded size of this item once re-appended to a buffer
    pub fn encoded_len(&self) -> usize {
        let source = self.source_line.as_ref().map(|s| s.len() + 1).unwrap_or(0);
        self.action_line.len() + 1 + source
    }
}

/// Split a bulk request body into action+source pairs
///
/// Any malformed action line terminates parsing with `MalformedRequest`.
/// A terminal line without a trailing newline is accepted; empty lines are
/// skipped.
pub fn split_request(body: &Bytes) -> Result<Vec<RequestItem>> {
    let mut items = Vec::new();
    let mut lines = LineIter::new(body);
    let mut ordinal = 0usize;

    while let Some(action_line) = lines.next() {
        if action_line.is_empty() {
            continue;
        }

        let (action, index, id) = parse_action_line(&action_line, ordinal)?;

        let source_line = if action.has_source() {
            match lines.next() {
                Some(line) => Some(line),
                None => {
                    return Err(BulkError::malformed_request(
                        ordinal,
                        format!("{} action is missing its source line", action),
                    ))
                }
            }
        } else {
            None
        };

        items.push(RequestItem {
            action,
            index,
            id,
            action_line,
            source_line,
            ordinal,
        });
        ordinal += 1;
    }

    Ok(items)
}

fn parse_action_line(line: &Bytes, ordinal: usize) -> Result<(ActionKind, Option<String>, Option<String>)> {
    let value: Value = serde_json::from_slice(line)
        .map_err(|e| BulkError::malformed_request(ordinal, e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| BulkError::malformed_request(ordinal, "action line is not an object"))?;

    let (key, meta) = object
        .iter()
        .next()
        .ok_or_else(|| BulkError::malformed_request(ordinal, "action line is empty"))?;

    let action = ActionKind::from_key(key)
        .ok_or_else(|| BulkError::malformed_request(ordinal, format!("unknown action '{key}'")))?;

    let field = |name: &str| {
        meta.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Ok((action, field("_index"), field("_id")))
}

/// Newline splitter yielding zero-copy slices without the terminator
struct LineIter<'a> {
    body: &'a Bytes,
    offset: usize,
}

impl<'a> LineIter<'a> {
    fn new(body: &'a Bytes) -> Self {
        Self { body, offset: 0 }
    }
}

impl Iterator for LineIter<'_> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.offset >= self.body.len() {
            return None;
        }
        let rest = &self.body[self.offset..];
        let line = match rest.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let line = self.body.slice(self.offset..self.offset + pos);
                self.offset += pos + 1;
                line
            }
            None => {
                let line = self.body.slice(self.offset..);
                self.offset = self.body.len();
                line
            }
        };
        Some(line)
    }
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
