use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::description::RelationshipDescription;
use crate::error::{RelcountError, Result};
use crate::types::NodeId;

/// Cached degrees of one node, keyed by description.
pub type DegreeMap = FxHashMap<RelationshipDescription, u64>;

/// A set of descriptions, as used for dirty tracking.
pub type DescriptionSet = FxHashSet<RelationshipDescription>;

/// Reads and writes the persisted degrees of a node.
///
/// A `write_degrees` followed by `read_degrees` for the same node and prefix
/// must return a map equal to the written `degrees`.
pub trait DegreeCachingStrategy: Send + Sync {
    /// Loads every cached degree stored under `prefix` on `node`.
    fn read_degrees(&self, node: NodeId, prefix: &str) -> Result<DegreeMap>;

    /// Persists `degrees`.
    ///
    /// `updated` holds the keys whose counts changed since the last read and
    /// `removed` the previously persisted keys that are gone. Implementations
    /// may use them to write incrementally.
    fn write_degrees(
        &self,
        node: NodeId,
        prefix: &str,
        degrees: &DegreeMap,
        updated: &DescriptionSet,
        removed: &DescriptionSet,
    ) -> Result<()>;
}

type StoreKey = (NodeId, String);

/// In-memory degree storage shared between clones.
#[derive(Clone, Default)]
pub struct MemoryDegreeStore {
    inner: Arc<RwLock<FxHashMap<StoreKey, BTreeMap<RelationshipDescription, u64>>>>,
}

impl MemoryDegreeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything stored under `prefix` on `node`.
    pub fn clear(&self, node: NodeId, prefix: &str) {
        self.inner.write().remove(&(node, prefix.to_owned()));
    }

    /// Nodes holding at least one degree under `prefix`, in ascending order.
    pub fn nodes(&self, prefix: &str) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .inner
            .read()
            .iter()
            .filter(|((_, p), degrees)| p == prefix && !degrees.is_empty())
            .map(|((node, _), _)| *node)
            .collect();
        nodes.sort_unstable();
        nodes
    }

    /// Degrees of `node` under `prefix` in description order.
    pub fn sorted_degrees(&self, node: NodeId, prefix: &str) -> Vec<(RelationshipDescription, u64)> {
        self.inner
            .read()
            .get(&(node, prefix.to_owned()))
            .map(|degrees| degrees.iter().map(|(d, c)| (d.clone(), *c)).collect())
            .unwrap_or_default()
    }
}

impl DegreeCachingStrategy for MemoryDegreeStore {
    fn read_degrees(&self, node: NodeId, prefix: &str) -> Result<DegreeMap> {
        Ok(self
            .inner
            .read()
            .get(&(node, prefix.to_owned()))
            .map(|degrees| degrees.iter().map(|(d, c)| (d.clone(), *c)).collect())
            .unwrap_or_default())
    }

    fn write_degrees(
        &self,
        node: NodeId,
        prefix: &str,
        degrees: &DegreeMap,
        updated: &DescriptionSet,
        removed: &DescriptionSet,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        let stored = inner.entry((node, prefix.to_owned())).or_default();
        for description in removed {
            stored.remove(description);
        }
        for description in updated {
            let count = degrees.get(description).copied().ok_or_else(|| {
                RelcountError::Storage(format!(
                    "updated degree {description} missing from degrees of node {node}"
                ))
            })?;
            if count == 0 {
                return Err(RelcountError::Storage(format!(
                    "refusing to store zero degree for {description} on node {node}"
                )));
            }
            stored.insert(description.clone(), count);
        }
        if stored.is_empty() {
            inner.remove(&(node, prefix.to_owned()));
        }
        Ok(())
    }
}
