//! Pass-through filter
//!
//! Does nothing; used to keep flows explicit in config and as a test
//! stand-in.

use std::sync::Arc;

use async_trait::async_trait;

use esgate_config::FilterConfig;

use crate::{Filter, FilterFactory, Registry, RequestContext, Result};

/// Filter that leaves the context untouched
#[derive(Debug, Default)]
pub struct NoopFilter;

impl NoopFilter {
    /// Create a no-op filter
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Filter for NoopFilter {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn process(&self, _ctx: &mut RequestContext) -> Result<()> {
        Ok(())
    }
}

/// Factory for [`NoopFilter`]
pub struct NoopFactory;

impl FilterFactory for NoopFactory {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn create(&self, _config: &FilterConfig, _registry: &Registry) -> Result<Arc<dyn Filter>> {
        Ok(Arc::new(NoopFilter::new()))
    }
}
