//! Keeps the number of cached degrees per node bounded by merging specific
//! entries into generalizations.
//!
//! [`ThresholdBasedCompactionStrategy`] drives the merge loop and asks a
//! [`GeneralizationStrategy`] which generalization to apply next. The default
//! strategy, [`GeneralizeFrequentlyChanging`], erases the property whose values
//! vary the most relative to its type's degree.

mod frequency;
mod generator;
mod threshold;

pub use frequency::{change_frequencies, GeneralizeFrequentlyChanging, PropertyChangeFrequency};
pub use generator::GeneralizationGenerator;
pub use threshold::ThresholdBasedCompactionStrategy;

use crate::cache::{DegreeCachingNode, DegreeMap};
use crate::description::RelationshipDescription;
use crate::error::Result;

/// Outcome of a compaction attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompactionState {
    /// The node holds no more entries than the threshold.
    Under,
    /// The node holds more entries than the threshold and needs a merge.
    Over,
    /// No further merge is possible; the node stays above the threshold.
    Stuck,
}

/// Keeps a node's cached degrees within bounds.
pub trait CompactionStrategy: Send + Sync {
    /// Compacts the cached degrees of `node` in place.
    ///
    /// Non-convergence is reported as [`CompactionState::Stuck`], never as an
    /// error.
    fn compact_relationship_counts(&self, node: &mut DegreeCachingNode) -> Result<CompactionState>;
}

/// Chooses a single generalization that merges several cached entries.
pub trait GeneralizationStrategy: Send + Sync {
    /// Best generalization of `degrees`, or `None` when no generalization
    /// merges two or more entries.
    fn produce_generalization(&self, degrees: &DegreeMap) -> Option<RelationshipDescription>;
}
