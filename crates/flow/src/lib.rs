//! Esgate Flow - Filter registry and flow engine
//!
//! Every accepted request becomes a [`RequestContext`] and is driven
//! through an ordered chain of filters - a flow - resolved by the router.
//! Filters inspect and mutate the context: rewrite the request, tag it,
//! persist parts of it to durable queues, invoke sub-flows, or end
//! processing.
//!
//! # Design Principles
//!
//! - **Explicit registry**: filters, flows and routers live in a
//!   [`Registry`] value built at startup; tests construct isolated
//!   registries
//! - **Factories, not prototypes**: a filter type registers a
//!   [`FilterFactory`]; instances are constructed from their parameter
//!   table, never cloned from a template
//! - **Short-circuit semantics**: a filter that clears the continue flag
//!   stops its flow; `finish` makes the context terminal
//! - **No escaping faults**: filter errors are trapped by the flow engine,
//!   logged with the filter identity and recorded on the context
//!
//! # Architecture
//!
//! ```text
//! [RequestContext] → [Filter 1] → [Filter 2] → ... → response emitted
//!                        │
//!                        └── may invoke a sub-flow, enqueue, tag, finish
//! ```
//!
//! # Adding a New Filter
//!
//! 1. Define a config struct deserialized from the instance parameter
//!    table, with `#[serde(default)]` defaults.
//! 2. Implement [`Filter`] for the filter struct.
//! 3. Implement [`FilterFactory`]; convert the parameters via
//!    `toml::Value::Table(params).try_into()`.
//! 4. Register the factory in [`default_registry`].
//!
//! # Modules
//!
//! - `context` - request context and replay envelope
//! - `flow` - sequential filter execution
//! - `registry` - factories, configs and memoized flows
//! - `noop` - pass-through filter
//! - `tag` - tag mutation filter
//! - `bulk_response` - bulk response partitioning and queue routing

mod context;
mod error;
mod flow;
mod registry;

pub mod bulk_response;
pub mod noop;
pub mod tag;

use async_trait::async_trait;

pub use bulk_response::{BulkResponseConfig, BulkResponseFactory, BulkResponseProcess};
pub use context::{GatewayRequest, GatewayResponse, RequestContext};
pub use error::{FlowError, Result};
pub use flow::{FilterFlow, FILTER_ERROR_TAG};
pub use noop::{NoopFactory, NoopFilter};
pub use registry::{FilterFactory, FlowServices, Registry};
pub use tag::{TagFactory, TagFilter};

/// A named unit operating on a request context
///
/// Implementations must be `Send + Sync`; one instance serves many
/// contexts concurrently. State beyond the construction-time config
/// belongs on the context, not the filter.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Name of this filter for logging and tracing
    fn name(&self) -> &'static str;

    /// Process a context
    ///
    /// Errors are trapped by the flow engine; a filter that wants to end
    /// processing calls [`RequestContext::finish`] instead of erroring.
    async fn process(&self, ctx: &mut RequestContext) -> Result<()>;
}

/// Create a registry with all built-in filters registered
///
/// Includes:
/// - `noop` - pass-through
/// - `tag` - add/remove context tags
/// - `bulk_response_process` - bulk response partitioning
pub fn default_registry(services: FlowServices) -> Registry {
    let registry = Registry::new(services);
    registry.register_filter(std::sync::Arc::new(NoopFactory));
    registry.register_filter(std::sync::Arc::new(TagFactory));
    registry.register_filter(std::sync::Arc::new(BulkResponseFactory));
    registry
}
