//! Read path: counting the relationships of a node that match a description.

mod cached;
mod fallback;
mod naive;

pub use cached::CachedRelationshipCounter;
pub use fallback::FallbackRelationshipCounter;
pub use naive::NaiveRelationshipCounter;

use crate::description::RelationshipDescription;
use crate::error::{RelcountError, Result};
use crate::types::NodeId;

/// Counts relationships of a node.
pub trait RelationshipCounter: Send + Sync {
    /// Total weight of the relationships of `node` matching `description`.
    fn count(&self, node: NodeId, description: &RelationshipDescription) -> Result<u64>;
}

fn checked_total(node: NodeId, description: &RelationshipDescription, total: u64, count: u64) -> Result<u64> {
    total.checked_add(count).ok_or_else(|| {
        RelcountError::UnableToCount(format!("{description} on node {node} exceeds {}", u64::MAX))
    })
}
