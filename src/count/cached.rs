use crate::cache::DegreeCachingNode;
use crate::config::RelcountConfig;
use crate::description::RelationshipDescription;
use crate::error::{RelcountError, Result};
use crate::types::NodeId;

use super::{checked_total, RelationshipCounter};

/// Answers counts from cached degrees alone.
///
/// Fails with [`RelcountError::UnableToCount`] when compaction merged away
/// the granularity the query needs.
#[derive(Clone)]
pub struct CachedRelationshipCounter {
    config: RelcountConfig,
}

impl CachedRelationshipCounter {
    /// Counts from the degrees stored through `config`.
    pub fn new(config: RelcountConfig) -> Self {
        Self { config }
    }
}

impl RelationshipCounter for CachedRelationshipCounter {
    fn count(&self, node: NodeId, description: &RelationshipDescription) -> Result<u64> {
        let mut caching_node = DegreeCachingNode::new(node, self.config.clone());
        let mut total = 0u64;
        for (cached, count) in caching_node.cached_degrees()? {
            if cached.is_more_specific_than(description) {
                total = checked_total(node, description, total, *count)?;
            } else if !cached.is_mutually_exclusive(description) {
                return Err(RelcountError::UnableToCount(format!(
                    "{description} on node {node} overlaps compacted degree {cached}; \
                     count naively or raise the compaction threshold"
                )));
            }
        }
        Ok(total)
    }
}
