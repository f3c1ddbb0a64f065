//! Minimal relationship model consumed by the cache, plus an in-memory graph.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{RelcountError, Result};
use crate::types::{NodeId, PropValue, RelationshipId};

/// Snapshot of a relationship as seen by the cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship identity.
    pub id: RelationshipId,
    /// Start node.
    pub start: NodeId,
    /// End node.
    pub end: NodeId,
    /// Relationship type name.
    pub rel_type: String,
    /// Property values keyed by name.
    pub properties: BTreeMap<String, PropValue>,
}

impl Relationship {
    /// Creates a relationship without properties.
    pub fn new(id: RelationshipId, start: NodeId, end: NodeId, rel_type: impl Into<String>) -> Self {
        Self {
            id,
            start,
            end,
            rel_type: rel_type.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Returns the relationship with an extra property set.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Read access to the relationships of a node in the host graph.
pub trait RelationshipSource: Send + Sync {
    /// All relationships that have `node` on either end.
    fn relationships(&self, node: NodeId) -> Result<Vec<Relationship>>;

    /// All nodes that currently have at least one relationship.
    fn nodes(&self) -> Result<Vec<NodeId>>;
}

/// Thread-safe in-memory graph keyed by relationship id.
#[derive(Default)]
pub struct MemoryGraph {
    relationships: RwLock<FxHashMap<RelationshipId, Relationship>>,
}

impl MemoryGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a relationship, rejecting duplicate ids.
    pub fn insert(&self, relationship: Relationship) -> Result<()> {
        let mut guard = self.relationships.write();
        if guard.contains_key(&relationship.id) {
            return Err(RelcountError::invalid(format!(
                "relationship {} already exists",
                relationship.id
            )));
        }
        guard.insert(relationship.id, relationship);
        Ok(())
    }

    /// Removes and returns a relationship.
    pub fn remove(&self, id: RelationshipId) -> Option<Relationship> {
        self.relationships.write().remove(&id)
    }

    /// Replaces a relationship, returning the previous version.
    pub fn replace(&self, relationship: Relationship) -> Option<Relationship> {
        self.relationships
            .write()
            .insert(relationship.id, relationship)
    }

    /// Returns a copy of a relationship.
    pub fn get(&self, id: RelationshipId) -> Option<Relationship> {
        self.relationships.read().get(&id).cloned()
    }

    /// Number of stored relationships.
    pub fn len(&self) -> usize {
        self.relationships.read().len()
    }

    /// Whether the graph holds no relationships.
    pub fn is_empty(&self) -> bool {
        self.relationships.read().is_empty()
    }
}

impl RelationshipSource for MemoryGraph {
    fn relationships(&self, node: NodeId) -> Result<Vec<Relationship>> {
        let guard = self.relationships.read();
        let mut found: Vec<Relationship> = guard
            .values()
            .filter(|rel| rel.start == node || rel.end == node)
            .cloned()
            .collect();
        found.sort_by_key(|rel| rel.id);
        Ok(found)
    }

    fn nodes(&self) -> Result<Vec<NodeId>> {
        let guard = self.relationships.read();
        let mut nodes: Vec<NodeId> = guard
            .values()
            .flat_map(|rel| [rel.start, rel.end])
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        Ok(nodes)
    }
}
