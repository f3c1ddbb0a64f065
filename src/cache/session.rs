use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use super::node::DegreeCachingNode;
use super::strategy::DegreeMap;
use crate::config::RelcountConfig;
use crate::description::Direction;
use crate::error::{RelcountError, Result};
use crate::graph::{Relationship, RelationshipSource};
use crate::types::NodeId;

/// Entry point of the write path: turns relationship events into degree
/// changes on the nodes they touch.
#[derive(Clone)]
pub struct NodeDegreeCache {
    config: RelcountConfig,
}

impl NodeDegreeCache {
    /// Creates a cache around `config`.
    pub fn new(config: RelcountConfig) -> Self {
        Self { config }
    }

    /// Configuration of this cache.
    pub fn config(&self) -> &RelcountConfig {
        &self.config
    }

    /// Starts a unit of work.
    pub fn begin(&self) -> CachingSession {
        CachingSession {
            config: self.config.clone(),
            nodes: FxHashMap::default(),
        }
    }

    /// Recomputes the cached degrees of `node` from the relationships in
    /// `source`, replacing whatever was cached before.
    pub fn rebuild_node(&self, node: NodeId, source: &dyn RelationshipSource) -> Result<()> {
        let relationships = source.relationships(node)?;
        let mut session = self.begin();
        session.node(node).reset()?;
        for relationship in &relationships {
            for default_direction in Direction::endpoint_defaults(relationship, node) {
                session.handle_created_relationship(relationship, node, default_direction)?;
            }
        }
        debug!(node = %node, relationships = relationships.len(), "relcount.rebuild.node");
        session.commit()
    }

    /// Rebuilds every node `source` knows about.
    pub fn rebuild(&self, source: &dyn RelationshipSource) -> Result<usize> {
        let nodes = source.nodes()?;
        for node in &nodes {
            self.rebuild_node(*node, source)?;
        }
        info!(nodes = nodes.len(), "relcount.rebuild.done");
        Ok(nodes.len())
    }
}

/// Degree changes of one unit of work, flushed together by
/// [`CachingSession::commit`]. Dropping a session discards its changes.
pub struct CachingSession {
    config: RelcountConfig,
    nodes: FxHashMap<NodeId, DegreeCachingNode>,
}

impl CachingSession {
    /// The caching node for `id`, created on first use.
    pub fn node(&mut self, id: NodeId) -> &mut DegreeCachingNode {
        let config = &self.config;
        self.nodes
            .entry(id)
            .or_insert_with(|| DegreeCachingNode::new(id, config.clone()))
    }

    /// Cached degrees of `id` as seen inside this unit of work.
    pub fn cached_degrees(&mut self, id: NodeId) -> Result<&DegreeMap> {
        self.node(id).cached_degrees()
    }

    /// Counts a new relationship on `point_of_view`.
    ///
    /// `default_direction` applies to self-relationships and must not be
    /// [`Direction::Both`].
    pub fn handle_created_relationship(
        &mut self,
        relationship: &Relationship,
        point_of_view: NodeId,
        default_direction: Direction,
    ) -> Result<()> {
        if default_direction == Direction::Both {
            return Err(RelcountError::invalid("default direction must not be BOTH"));
        }
        if !self.config.inclusion.include_relationship(relationship) {
            return Ok(());
        }
        let description = self
            .config
            .describe(relationship, point_of_view, default_direction)?;
        let weight = self
            .config
            .weighing
            .relationship_weight(relationship, point_of_view)?;
        self.node(point_of_view).increment_degree(&description, weight)
    }

    /// Uncounts a deleted relationship on `point_of_view`.
    pub fn handle_deleted_relationship(
        &mut self,
        relationship: &Relationship,
        point_of_view: NodeId,
        default_direction: Direction,
    ) -> Result<()> {
        if default_direction == Direction::Both {
            return Err(RelcountError::invalid("default direction must not be BOTH"));
        }
        if !self.config.inclusion.include_relationship(relationship) {
            return Ok(());
        }
        let description = self
            .config
            .describe(relationship, point_of_view, default_direction)?;
        let weight = self
            .config
            .weighing
            .relationship_weight(relationship, point_of_view)?;
        self.node(point_of_view).decrement_degree(&description, weight)
    }

    /// Counts a new relationship on both of its nodes.
    pub fn relationship_created(&mut self, relationship: &Relationship) -> Result<()> {
        self.handle_created_relationship(relationship, relationship.start, Direction::Incoming)?;
        self.handle_created_relationship(relationship, relationship.end, Direction::Outgoing)
    }

    /// Uncounts a deleted relationship on both of its nodes.
    pub fn relationship_deleted(&mut self, relationship: &Relationship) -> Result<()> {
        self.handle_deleted_relationship(relationship, relationship.start, Direction::Incoming)?;
        self.handle_deleted_relationship(relationship, relationship.end, Direction::Outgoing)
    }

    /// Moves the counts of a relationship whose properties changed.
    pub fn relationship_changed(&mut self, previous: &Relationship, current: &Relationship) -> Result<()> {
        if previous.id != current.id || previous.start != current.start || previous.end != current.end {
            return Err(RelcountError::invalid(format!(
                "relationship {} cannot change its identity or ends",
                previous.id
            )));
        }
        self.relationship_deleted(previous)?;
        self.relationship_created(current)
    }

    /// Number of nodes touched so far.
    pub fn touched(&self) -> usize {
        self.nodes.len()
    }

    /// Flushes every touched node once, in node id order.
    ///
    /// Writes are not atomic across nodes. A failing node does not stop the
    /// others from flushing; the first error is returned and the nodes that
    /// flushed stay written, so the failed ones must be rebuilt.
    pub fn commit(self) -> Result<()> {
        let mut nodes: Vec<(NodeId, DegreeCachingNode)> = self.nodes.into_iter().collect();
        nodes.sort_unstable_by_key(|(id, _)| *id);
        let mut first_error = None;
        for (id, node) in nodes {
            if let Err(err) = node.flush() {
                warn!(node = %id, error = %err, "relcount.commit.flush_failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
