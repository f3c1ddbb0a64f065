use std::sync::Arc;

use tracing::warn;

use crate::config::RelcountConfig;
use crate::description::RelationshipDescription;
use crate::error::{RelcountError, Result};
use crate::graph::RelationshipSource;
use crate::types::NodeId;

use super::{CachedRelationshipCounter, NaiveRelationshipCounter, RelationshipCounter};

/// Counts from the cache, walking the graph when the cache cannot answer.
pub struct FallbackRelationshipCounter {
    cached: CachedRelationshipCounter,
    naive: NaiveRelationshipCounter,
    config: RelcountConfig,
}

impl FallbackRelationshipCounter {
    /// Creates a counter over the cache configured by `config` and `source`.
    pub fn new(source: Arc<dyn RelationshipSource>, config: RelcountConfig) -> Self {
        Self {
            cached: CachedRelationshipCounter::new(config.clone()),
            naive: NaiveRelationshipCounter::new(source, config.clone()),
            config,
        }
    }
}

impl RelationshipCounter for FallbackRelationshipCounter {
    fn count(&self, node: NodeId, description: &RelationshipDescription) -> Result<u64> {
        match self.cached.count(node, description) {
            Err(RelcountError::UnableToCount(reason)) => {
                warn!(node = %node, description = %description, reason = %reason, "relcount.count.fallback");
                self.config.metrics.counter_fallback();
                self.naive.count(node, description)
            }
            other => other,
        }
    }
}
