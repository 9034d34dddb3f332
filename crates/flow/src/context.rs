//! Request context and replay envelope
//!
//! A [`RequestContext`] is created per accepted request, mutated by the
//! filters of its resolved flow, and dropped after the response is
//! written. It carries the request/response pair plus the control state
//! filters coordinate through: continue/finished/failed/cancelled flags, a
//! tag set, a typed scratch map and the flow-process trace.
//!
//! [`GatewayRequest`] doubles as the replay envelope: requests persisted
//! to queues are encoded with [`GatewayRequest::encode`] and replayed by
//! the disk-queue consumer after [`GatewayRequest::decode`].

use std::any::Any;
use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{FlowError, Result};

/// A replayable HTTP request
///
/// The URI is kept as a single string; scheme and host surgery for
/// upstream dispatch works on the string form so a path-only URI stays a
/// path-only URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// HTTP verb, uppercase
    pub method: String,
    /// Full URI or path-and-query
    pub uri: String,
    /// Header pairs in arrival order
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Vec<u8>,
}

impl GatewayRequest {
    /// Create a request with no headers or body
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Set the body, builder-style
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Append a header, builder-style
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Body as shared bytes
    pub fn body_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.body)
    }

    /// First value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a header, replacing any existing values
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.remove_header(name);
        self.headers.push((name.to_string(), value.into()));
    }

    /// Remove all values of a header
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// URI scheme, when the URI is absolute
    pub fn scheme(&self) -> Option<&str> {
        self.uri.split_once("://").map(|(scheme, _)| scheme)
    }

    /// Host (host:port), when the URI is absolute
    pub fn host(&self) -> Option<&str> {
        let (_, rest) = self.uri.split_once("://")?;
        Some(rest.split('/').next().unwrap_or(rest))
    }

    /// Path component, query excluded
    pub fn path(&self) -> &str {
        let rest = match self.uri.split_once("://") {
            Some((_, rest)) => match rest.find('/') {
                Some(pos) => &rest[pos..],
                None => "/",
            },
            None => self.uri.as_str(),
        };
        rest.split('?').next().unwrap_or(rest)
    }

    /// Path and query, scheme and host stripped
    pub fn path_and_query(&self) -> &str {
        match self.uri.split_once("://") {
            Some((_, rest)) => match rest.find('/') {
                Some(pos) => &rest[pos..],
                None => "/",
            },
            None => self.uri.as_str(),
        }
    }

    /// Point the request at `scheme://host`, keeping path and query
    pub fn set_scheme_and_host(&mut self, scheme: &str, host: &str) {
        self.uri = format!("{scheme}://{host}{}", self.path_and_query());
    }

    /// Encode into the on-queue replay envelope
    pub fn encode(&self) -> Bytes {
        // Serialization of a plain struct cannot fail
        Bytes::from(bincode::serialize(self).expect("encode replay request"))
    }

    /// Decode a replay envelope
    pub fn decode(payload: &[u8]) -> Result<Self> {
        bincode::deserialize(payload).map_err(|e| FlowError::Decode(e.to_string()))
    }

    /// Encode with the body replaced
    ///
    /// Content-Length and Content-Encoding are dropped: the override body
    /// is plain and its length is recomputed at dispatch.
    pub fn override_body_encode(&self, body: &[u8]) -> Bytes {
        let mut clone = self.clone();
        clone.body = body.to_vec();
        clone.remove_header("Content-Length");
        clone.remove_header("Content-Encoding");
        clone.encode()
    }
}

/// The response side of a context
#[derive(Debug, Clone, Default)]
pub struct GatewayResponse {
    /// Status code; 0 until a response is produced
    pub status: u16,
    /// Header pairs
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

impl GatewayResponse {
    /// Create a response with a status and body
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// In-flight request state threaded through a filter flow
pub struct RequestContext {
    /// The request as received (and possibly rewritten by filters)
    pub request: GatewayRequest,
    /// The response produced so far
    pub response: GatewayResponse,

    continue_: bool,
    finished: bool,
    failed: bool,
    cancelled: bool,

    tags: BTreeSet<String>,
    scratch: HashMap<String, Box<dyn Any + Send + Sync>>,
    flow_trace: Vec<String>,
}

impl RequestContext {
    /// Create a context for a request with an empty response
    pub fn new(request: GatewayRequest) -> Self {
        Self {
            request,
            response: GatewayResponse::default(),
            continue_: true,
            finished: false,
            failed: false,
            cancelled: false,
            tags: BTreeSet::new(),
            scratch: HashMap::new(),
            flow_trace: Vec::new(),
        }
    }

    /// Attach a response, builder-style
    #[must_use]
    pub fn with_response(mut self, response: GatewayResponse) -> Self {
        self.response = response;
        self
    }

    /// Whether the next filter in a flow should run
    pub fn should_continue(&self) -> bool {
        self.continue_ && !self.cancelled
    }

    /// Stop further filters in the current flow
    pub fn stop(&mut self) {
        self.continue_ = false;
    }

    /// Mark the context terminal; no further filter executes
    pub fn finish(&mut self) {
        self.finished = true;
        self.continue_ = false;
    }

    /// Whether the context is terminal
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Record a filter fault; the flow engine decides whether to go on
    pub fn set_failed(&mut self) {
        self.failed = true;
    }

    /// Whether any filter faulted on this context
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Request cancellation; observed at the next flow boundary
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Add labels to the tag set
    pub fn add_tags<S: AsRef<str>>(&mut self, tags: &[S]) {
        for tag in tags {
            self.tags.insert(tag.as_ref().to_string());
        }
    }

    /// Remove labels from the tag set
    pub fn remove_tags<S: AsRef<str>>(&mut self, tags: &[S]) {
        for tag in tags {
            self.tags.remove(tag.as_ref());
        }
    }

    /// Whether a label is present
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// The tag set, sorted
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Store a typed value in the scratch map
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.scratch.insert(key.into(), Box::new(value));
    }

    /// Read a typed value from the scratch map
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.scratch.get(key).and_then(|v| v.downcast_ref())
    }

    /// Append an entry to the flow-process trace
    pub fn add_flow_process(&mut self, entry: impl Into<String>) {
        self.flow_trace.push(entry.into());
    }

    /// The flow-process trace, in append order
    pub fn flow_trace(&self) -> &[String] {
        &self.flow_trace
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
