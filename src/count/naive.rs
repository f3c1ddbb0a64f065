use std::sync::Arc;

use crate::config::RelcountConfig;
use crate::description::{Direction, RelationshipDescription};
use crate::error::Result;
use crate::graph::RelationshipSource;
use crate::types::NodeId;

use super::{checked_total, RelationshipCounter};

/// Counts by walking the relationships of a node.
///
/// Always exact, at the price of visiting every relationship. Weights and
/// inclusion rules come from the configuration, so results agree with what
/// the cache would hold without compaction.
pub struct NaiveRelationshipCounter {
    source: Arc<dyn RelationshipSource>,
    config: RelcountConfig,
}

impl NaiveRelationshipCounter {
    /// Counts relationships found in `source`.
    pub fn new(source: Arc<dyn RelationshipSource>, config: RelcountConfig) -> Self {
        Self { source, config }
    }
}

impl RelationshipCounter for NaiveRelationshipCounter {
    fn count(&self, node: NodeId, description: &RelationshipDescription) -> Result<u64> {
        let mut total = 0u64;
        for relationship in self.source.relationships(node)? {
            if relationship.rel_type != description.rel_type()
                || !self.config.inclusion.include_relationship(&relationship)
            {
                continue;
            }
            for default_direction in Direction::endpoint_defaults(&relationship, node) {
                let candidate = self.config.describe(&relationship, node, default_direction)?;
                if candidate.is_more_specific_than(description) {
                    let weight = self.config.weighing.relationship_weight(&relationship, node)?;
                    total = checked_total(node, description, total, weight)?;
                }
            }
        }
        Ok(total)
    }
}
