//! Filter flows - ordered filter execution over a context
//!
//! # Design
//!
//! - **Sequential**: filters run in declared order, each seeing the
//!   context as its predecessors left it
//! - **Short-circuit**: once a filter clears the continue flag, no further
//!   filter in the flow executes
//! - **Fault isolation**: a filter error never propagates out of
//!   `process`; it is logged with the filter's identity and recorded on
//!   the context, and the flow moves on

use std::fmt;
use std::sync::Arc;

use crate::{Filter, RequestContext};

/// Tag recorded on a context when a filter faults
pub const FILTER_ERROR_TAG: &str = "filter_error";

/// An identifier plus an ordered sequence of filter instances
#[derive(Clone, Default)]
pub struct FilterFlow {
    id: String,
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterFlow {
    /// Create an empty flow
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filters: Vec::new(),
        }
    }

    /// Flow identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a filter
    pub fn join_filter(&mut self, filter: Arc<dyn Filter>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Append every filter of another flow, in its order
    pub fn join_flow(&mut self, other: &FilterFlow) -> &mut Self {
        self.filters.extend(other.filters.iter().cloned());
        self
    }

    /// Number of filters in the flow
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the flow has no filters
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Names of the filters, in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run the flow over a context
    ///
    /// Before each filter the continue flag is checked; a cleared flag
    /// stops the walk. Filter errors are trapped: the engine logs them
    /// with the filter name, tags the context [`FILTER_ERROR_TAG`] and
    /// marks it failed, then keeps walking unless the filter also cleared
    /// the continue flag.
    pub async fn process(&self, ctx: &mut RequestContext) {
        for filter in &self.filters {
            if !ctx.should_continue() {
                tracing::debug!(flow = %self.id, filter = filter.name(), "flow short-circuited");
                break;
            }
            tracing::trace!(flow = %self.id, filter = filter.name(), "processing filter");
            if let Err(error) = filter.process(ctx).await {
                tracing::error!(
                    flow = %self.id,
                    filter = filter.name(),
                    error = %error,
                    "filter failed"
                );
                ctx.add_tags(&[FILTER_ERROR_TAG]);
                ctx.set_failed();
            }
        }
    }
}

impl fmt::Display for FilterFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(" > "))
    }
}

#[cfg(test)]
#[path = "flow_test.rs"]
mod tests;
