use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::frequency::PropertyChangeFrequency;
use crate::description::{Predicate, RelationshipDescription};

type PropertySet = BTreeSet<String>;

/// Greedy search for a generalization that merges the most cached entries.
///
/// Frequencies are consumed in order. For each `(type, property)` the
/// generator tries erasing the property alone, then together with every
/// property set already tried for that type, smallest sets first.
pub struct GeneralizationGenerator {
    descriptions: Vec<RelationshipDescription>,
    frequencies: std::vec::IntoIter<PropertyChangeFrequency>,
    tried: FxHashMap<String, Vec<PropertySet>>,
}

impl GeneralizationGenerator {
    /// Creates a generator over `descriptions`, ranked by `frequencies`.
    pub fn new<I>(descriptions: I, frequencies: Vec<PropertyChangeFrequency>) -> Self
    where
        I: IntoIterator<Item = RelationshipDescription>,
    {
        let mut descriptions: Vec<RelationshipDescription> = descriptions.into_iter().collect();
        descriptions.sort();
        descriptions.dedup();
        Self {
            descriptions,
            frequencies: frequencies.into_iter(),
            tried: FxHashMap::default(),
        }
    }

    /// Next generalization covering at least two descriptions, if any.
    pub fn generate(&mut self) -> Option<RelationshipDescription> {
        while let Some(frequency) = self.frequencies.next() {
            let candidates = self.new_property_sets(&frequency);
            for properties in &candidates {
                if let Some(found) = self.best_for(frequency.rel_type(), properties) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn new_property_sets(&mut self, frequency: &PropertyChangeFrequency) -> Vec<PropertySet> {
        let tried = self.tried.entry(frequency.rel_type().to_owned()).or_default();
        let property = frequency.property().to_owned();

        let mut sets: Vec<PropertySet> = Vec::with_capacity(tried.len() + 1);
        sets.push(BTreeSet::from([property.clone()]));
        for used in tried.iter() {
            let mut set = used.clone();
            set.insert(property.clone());
            sets.push(set);
        }
        sets.sort_by_key(BTreeSet::len);

        let mut fresh = Vec::with_capacity(sets.len());
        for set in sets {
            if !tried.contains(&set) && !fresh.contains(&set) {
                fresh.push(set);
            }
        }
        tried.extend(fresh.iter().cloned());
        fresh
    }

    fn best_for(&self, rel_type: &str, properties: &PropertySet) -> Option<RelationshipDescription> {
        let mut best: Option<RelationshipDescription> = None;
        let mut best_matches = 1;
        for candidate in self.descriptions.iter().filter(|d| d.rel_type() == rel_type) {
            let generalized = properties
                .iter()
                .fold(candidate.clone(), |d, key| d.with(key, Predicate::Any));
            let matches = self
                .descriptions
                .iter()
                .filter(|d| d.is_more_specific_than(&generalized))
                .count();
            if matches > best_matches {
                best_matches = matches;
                best = Some(generalized);
            }
        }
        best
    }
}
