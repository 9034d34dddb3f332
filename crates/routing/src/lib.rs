//! Esgate Routing - Request routing onto filter flows
//!
//! A route table is compiled once at startup from a `RouterConfig` and is
//! read-only afterwards. Resolution walks the rules in declared order; the
//! first rule whose method set and any path pattern match wins. Unmatched
//! requests fall back to the default flow, and the tracing flow (when
//! configured) is appended to every resolved chain.
//!
//! Path patterns support three forms:
//!
//! - exact: `/_cluster/health`
//! - `:param` - matches exactly one non-empty segment: `/:index/_doc`
//! - `*suffix` - matches one or more trailing segments: `/_cat/*item`;
//!   mid-pattern it consumes segments until the remainder matches:
//!   `/*index/_search`
//!
//! Whether the resolved flow names exist is the dispatcher's concern; the
//! table only resolves names.

mod pattern;
mod table;

pub use pattern::path_matches;
pub use table::{Resolution, RouteTable};

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
