use std::sync::Arc;

use tracing::{debug, warn};

use super::frequency::GeneralizeFrequentlyChanging;
use super::{CompactionState, CompactionStrategy, GeneralizationStrategy};
use crate::cache::DegreeCachingNode;
use crate::description::RelationshipDescription;
use crate::error::{RelcountError, Result};

/// Merges cached entries until a node holds at most `threshold` of them.
///
/// Every round asks the [`GeneralizationStrategy`] for one generalization and
/// replaces all cached entries more specific than it by a single entry holding
/// their summed count. Rounds stop once the node is under the threshold or no
/// generalization merges two or more entries.
#[derive(Clone)]
pub struct ThresholdBasedCompactionStrategy {
    threshold: usize,
    generalization: Arc<dyn GeneralizationStrategy>,
}

impl ThresholdBasedCompactionStrategy {
    /// Compacts with [`GeneralizeFrequentlyChanging`].
    pub fn new(threshold: usize) -> Self {
        Self::with_generalization(threshold, Arc::new(GeneralizeFrequentlyChanging))
    }

    /// Compacts with a custom generalization strategy.
    pub fn with_generalization(threshold: usize, generalization: Arc<dyn GeneralizationStrategy>) -> Self {
        Self {
            threshold,
            generalization,
        }
    }

    fn state(&self, entries: usize) -> CompactionState {
        if entries <= self.threshold {
            CompactionState::Under
        } else {
            CompactionState::Over
        }
    }

    fn stuck(&self, node: &DegreeCachingNode, entries: usize) -> CompactionState {
        warn!(
            node = %node.id(),
            threshold = self.threshold,
            entries,
            "relcount.compaction.stuck"
        );
        node.config().metrics.compaction_stuck();
        CompactionState::Stuck
    }
}

impl CompactionStrategy for ThresholdBasedCompactionStrategy {
    fn compact_relationship_counts(&self, node: &mut DegreeCachingNode) -> Result<CompactionState> {
        let initial = node.cached_degrees()?.len();
        if self.state(initial) == CompactionState::Under {
            return Ok(CompactionState::Under);
        }
        node.config().metrics.compaction_started();

        for _ in 0..initial {
            let degrees = node.cached_degrees()?;
            let entries = degrees.len();
            if self.state(entries) == CompactionState::Under {
                return Ok(CompactionState::Under);
            }

            let Some(generalization) = self.generalization.produce_generalization(degrees) else {
                return Ok(self.stuck(node, entries));
            };
            let mut absorbed: Vec<(RelationshipDescription, u64)> = degrees
                .iter()
                .filter(|(description, _)| description.is_more_specific_than(&generalization))
                .map(|(description, count)| (description.clone(), *count))
                .collect();
            if absorbed.len() < 2 {
                return Ok(self.stuck(node, entries));
            }
            absorbed.sort();

            let existing = node.absorbing_count(&generalization)?;
            let total = absorbed
                .iter()
                .try_fold(0u64, |sum, (_, count)| sum.checked_add(*count))
                .filter(|total| total.checked_add(existing).is_some())
                .ok_or_else(|| RelcountError::invalid(format!("merging into {generalization} would overflow")))?;
            for (description, count) in &absorbed {
                node.decrement_degree(description, *count)?;
            }
            node.increment_degree_with(&generalization, total, true)?;

            debug!(
                node = %node.id(),
                generalization = %generalization,
                absorbed = absorbed.len(),
                total,
                "relcount.compaction.merge"
            );
            node.config().metrics.generalization_applied(absorbed.len());
        }

        let entries = node.cached_degrees()?.len();
        match self.state(entries) {
            CompactionState::Under => Ok(CompactionState::Under),
            _ => Ok(self.stuck(node, entries)),
        }
    }
}
