use std::sync::Arc;

use tracing::{debug, warn};

use super::strategy::{DegreeMap, DescriptionSet};
use crate::compact::CompactionState;
use crate::config::RelcountConfig;
use crate::description::RelationshipDescription;
use crate::error::{RelcountError, Result};
use crate::types::NodeId;

struct Loaded {
    degrees: DegreeMap,
    persisted: DescriptionSet,
    updated: DescriptionSet,
    removed: DescriptionSet,
}

impl Loaded {
    fn put(&mut self, description: RelationshipDescription, count: u64) {
        self.removed.remove(&description);
        self.updated.insert(description.clone());
        self.degrees.insert(description, count);
    }

    fn delete(&mut self, description: &RelationshipDescription) {
        self.degrees.remove(description);
        self.updated.remove(description);
        if self.persisted.contains(description) {
            self.removed.insert(description.clone());
        }
    }

    /// The cached entry a relationship described by `description` counts into:
    /// the entry itself, else the smallest cached generalization of it.
    fn absorbing_entry(&self, description: &RelationshipDescription) -> Option<RelationshipDescription> {
        if self.degrees.contains_key(description) {
            return Some(description.clone());
        }
        self.degrees
            .keys()
            .filter(|cached| cached.is_more_general_than(description))
            .min()
            .cloned()
    }
}

/// Cached degrees of one node for the duration of one unit of work.
///
/// Degrees are read from the [`DegreeCachingStrategy`](super::DegreeCachingStrategy)
/// on first access and written back once by [`DegreeCachingNode::flush`],
/// which consumes the node.
pub struct DegreeCachingNode {
    id: NodeId,
    config: RelcountConfig,
    /// `None` until degrees are first read from the caching strategy.
    loaded: Option<Loaded>,
}

impl DegreeCachingNode {
    /// Creates a node cache; nothing is read until degrees are first needed.
    pub fn new(id: NodeId, config: RelcountConfig) -> Self {
        Self {
            id,
            config,
            loaded: None,
        }
    }

    /// Identity of the underlying node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Configuration this node was created with.
    pub fn config(&self) -> &RelcountConfig {
        &self.config
    }

    /// Current cached degrees, loading them if necessary.
    pub fn cached_degrees(&mut self) -> Result<&DegreeMap> {
        Ok(&self.ensure_loaded()?.degrees)
    }

    /// Increments the degree for `description` by `delta`, compacting when a
    /// new entry appears.
    pub fn increment_degree(&mut self, description: &RelationshipDescription, delta: u64) -> Result<()> {
        self.increment_degree_with(description, delta, false)
    }

    /// Increments the degree for `description` by `delta`.
    ///
    /// A relationship already absorbed by a cached generalization is counted
    /// into that generalization. Otherwise a new entry is created and, unless
    /// `prevent_compaction` is set, the compaction strategy runs. A count that
    /// would overflow is rejected and leaves the cache untouched.
    pub fn increment_degree_with(
        &mut self,
        description: &RelationshipDescription,
        delta: u64,
        prevent_compaction: bool,
    ) -> Result<()> {
        if delta == 0 {
            return Err(RelcountError::invalid("degree delta must be positive"));
        }
        let loaded = self.ensure_loaded()?;
        match loaded.absorbing_entry(description) {
            Some(target) => {
                let current = loaded.degrees.get(&target).copied().unwrap_or(0);
                let count = current.checked_add(delta).ok_or_else(|| {
                    RelcountError::invalid(format!("degree of {target} would overflow: {current} + {delta}"))
                })?;
                loaded.put(target, count);
                Ok(())
            }
            None => {
                loaded.put(description.clone(), delta);
                if prevent_compaction {
                    return Ok(());
                }
                self.compact().map(|_| ())
            }
        }
    }

    /// Decrements the degree for `description` by `delta`, removing the
    /// entry when it reaches zero.
    ///
    /// Fails with [`RelcountError::NeedsInitialization`] when nothing counts
    /// the description or its count is below `delta`; the cache is then left
    /// untouched.
    pub fn decrement_degree(&mut self, description: &RelationshipDescription, delta: u64) -> Result<()> {
        if delta == 0 {
            return Err(RelcountError::invalid("degree delta must be positive"));
        }
        let id = self.id;
        let loaded = self.ensure_loaded()?;
        let Some(target) = loaded.absorbing_entry(description) else {
            warn!(node = %id, description = %description, "relcount.degree.missing");
            return Err(RelcountError::NeedsInitialization {
                node: id,
                reason: format!("{description} was not present"),
            });
        };
        let count = loaded.degrees.get(&target).copied().unwrap_or(0);
        if count < delta {
            warn!(node = %id, description = %target, count, delta, "relcount.degree.out_of_sync");
            return Err(RelcountError::NeedsInitialization {
                node: id,
                reason: format!("{target} was out of sync: {count} < {delta}"),
            });
        }
        if count == delta {
            loaded.delete(&target);
        } else {
            loaded.put(target, count - delta);
        }
        Ok(())
    }

    /// Removes every cached degree, as the first step of a rebuild.
    pub fn reset(&mut self) -> Result<()> {
        let loaded = self.ensure_loaded()?;
        let cached: Vec<RelationshipDescription> = loaded.degrees.keys().cloned().collect();
        for description in &cached {
            loaded.delete(description);
        }
        Ok(())
    }

    /// Writes the net effect of this unit of work through the caching strategy.
    ///
    /// Nodes whose degrees were never loaded, or that ended unchanged, write
    /// nothing.
    pub fn flush(self) -> Result<()> {
        let Some(loaded) = self.loaded else {
            return Ok(());
        };
        if loaded.updated.is_empty() && loaded.removed.is_empty() {
            return Ok(());
        }
        debug!(
            node = %self.id,
            updated = loaded.updated.len(),
            removed = loaded.removed.len(),
            "relcount.degrees.flush"
        );
        self.config
            .metrics
            .degrees_flushed(loaded.updated.len(), loaded.removed.len());
        self.config.caching.write_degrees(
            self.id,
            &self.config.prefix,
            &loaded.degrees,
            &loaded.updated,
            &loaded.removed,
        )
    }

    fn compact(&mut self) -> Result<CompactionState> {
        let compaction = Arc::clone(&self.config.compaction);
        compaction.compact_relationship_counts(self)
    }

    /// Count of the cached entry that `description` would be counted into,
    /// or zero when it would start a new entry.
    pub(crate) fn absorbing_count(&mut self, description: &RelationshipDescription) -> Result<u64> {
        let loaded = self.ensure_loaded()?;
        Ok(loaded
            .absorbing_entry(description)
            .and_then(|target| loaded.degrees.get(&target).copied())
            .unwrap_or(0))
    }

    fn ensure_loaded(&mut self) -> Result<&mut Loaded> {
        let loaded = match self.loaded.take() {
            Some(loaded) => loaded,
            None => self.load()?,
        };
        Ok(self.loaded.insert(loaded))
    }

    fn load(&self) -> Result<Loaded> {
        let mut degrees = self.config.caching.read_degrees(self.id, &self.config.prefix)?;
        degrees.retain(|_, count| *count > 0);
        debug!(node = %self.id, entries = degrees.len(), "relcount.degrees.load");
        self.config.metrics.degrees_loaded(degrees.len());
        let persisted = degrees.keys().cloned().collect();
        Ok(Loaded {
            degrees,
            persisted,
            updated: DescriptionSet::default(),
            removed: DescriptionSet::default(),
        })
    }
}
