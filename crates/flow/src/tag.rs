//! Tag mutation filter
//!
//! Adds and removes labels on the context tag set. Downstream policy
//! (metrics labels, queue selection, response shaping) keys off tags.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use esgate_config::FilterConfig;

use crate::{Filter, FilterFactory, FlowError, Registry, RequestContext, Result};

/// Parameters of one tag filter instance
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Labels added to every context passing through
    pub add: Vec<String>,

    /// Labels removed from every context passing through
    pub remove: Vec<String>,
}

/// Filter that mutates the context tag set
#[derive(Debug)]
pub struct TagFilter {
    config: TagConfig,
}

impl TagFilter {
    /// Create a tag filter from its config
    pub fn new(config: TagConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Filter for TagFilter {
    fn name(&self) -> &'static str {
        "tag"
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<()> {
        ctx.add_tags(&self.config.add);
        ctx.remove_tags(&self.config.remove);
        Ok(())
    }
}

/// Factory for [`TagFilter`]
pub struct TagFactory;

impl FilterFactory for TagFactory {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn create(&self, config: &FilterConfig, _registry: &Registry) -> Result<Arc<dyn Filter>> {
        let tag_config: TagConfig = config
            .parameters_value()
            .try_into()
            .map_err(|e: toml::de::Error| FlowError::filter_config("tag", e.to_string()))?;
        Ok(Arc::new(TagFilter::new(tag_config)))
    }
}
