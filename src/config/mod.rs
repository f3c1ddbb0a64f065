//! Explicitly constructed configuration threaded through the cache.

mod inclusion;
mod settings;
mod weighing;

use std::sync::Arc;

pub use inclusion::{IncludeAll, InclusionRules, RelationshipInclusion};
pub use settings::RelcountSettings;
pub use weighing::{OneForEach, WeighByProperty, WeighingStrategy};

use crate::cache::DegreeCachingStrategy;
use crate::compact::{CompactionStrategy, ThresholdBasedCompactionStrategy};
use crate::description::{Direction, PropertiesDescription, RelationshipDescription};
use crate::error::Result;
use crate::graph::Relationship;
use crate::metrics::{default_metrics, CacheMetrics};
use crate::types::NodeId;

/// Compaction threshold used when none is configured.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 20;

/// Key prefix under which degrees are stored when none is configured.
pub const DEFAULT_PREFIX: &str = "_GA_FRC_";

/// Collaborators and settings for one relationship count cache.
#[derive(Clone)]
pub struct RelcountConfig {
    /// Reads and writes the persisted degrees of a node.
    pub caching: Arc<dyn DegreeCachingStrategy>,
    /// Keeps the number of cached entries per node bounded.
    pub compaction: Arc<dyn CompactionStrategy>,
    /// Weight of each relationship.
    pub weighing: Arc<dyn WeighingStrategy>,
    /// Which relationships and properties are counted.
    pub inclusion: Arc<dyn RelationshipInclusion>,
    /// Cache activity metrics.
    pub metrics: Arc<dyn CacheMetrics>,
    /// Prefix distinguishing this cache's data from other caches on a node.
    pub prefix: String,
}

impl RelcountConfig {
    /// Creates a configuration with default strategies around `caching`.
    pub fn new(caching: Arc<dyn DegreeCachingStrategy>) -> Self {
        Self {
            caching,
            compaction: Arc::new(ThresholdBasedCompactionStrategy::new(
                DEFAULT_COMPACTION_THRESHOLD,
            )),
            weighing: Arc::new(OneForEach),
            inclusion: Arc::new(IncludeAll),
            metrics: default_metrics(),
            prefix: DEFAULT_PREFIX.to_owned(),
        }
    }

    /// Sets the compaction strategy.
    pub fn compaction(mut self, compaction: Arc<dyn CompactionStrategy>) -> Self {
        self.compaction = compaction;
        self
    }

    /// Uses threshold-based compaction with the given threshold.
    pub fn with_threshold(self, threshold: usize) -> Self {
        self.compaction(Arc::new(ThresholdBasedCompactionStrategy::new(threshold)))
    }

    /// Sets the relationship weighing strategy.
    pub fn weighing(mut self, weighing: Arc<dyn WeighingStrategy>) -> Self {
        self.weighing = weighing;
        self
    }

    /// Sets the inclusion policy.
    pub fn inclusion(mut self, inclusion: Arc<dyn RelationshipInclusion>) -> Self {
        self.inclusion = inclusion;
        self
    }

    /// Sets the metrics sink.
    pub fn metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Sets the storage key prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Literal description of `relationship` restricted to included properties.
    pub fn describe(
        &self,
        relationship: &Relationship,
        point_of_view: NodeId,
        default_direction: Direction,
    ) -> Result<RelationshipDescription> {
        let direction = Direction::resolve(relationship, point_of_view, default_direction)?;
        let properties = PropertiesDescription::of_values(
            relationship
                .properties
                .iter()
                .filter(|(key, _)| self.inclusion.include_property(key, relationship))
                .map(|(key, value)| (key.as_str(), value)),
        );
        RelationshipDescription::new(relationship.rel_type.clone(), direction, properties)
    }
}
