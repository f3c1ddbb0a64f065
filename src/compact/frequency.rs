use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashSet;

use super::generator::GeneralizationGenerator;
use super::GeneralizationStrategy;
use crate::cache::DegreeMap;
use crate::description::{Predicate, RelationshipDescription};

/// How often the values of one property change relative to the total degree
/// of its relationship type.
///
/// Ordered by frequency descending, then type and property ascending.
#[derive(Clone, Debug)]
pub struct PropertyChangeFrequency {
    rel_type: String,
    property: String,
    frequency: f64,
}

impl PropertyChangeFrequency {
    /// Creates a frequency entry.
    pub fn new(rel_type: impl Into<String>, property: impl Into<String>, frequency: f64) -> Self {
        Self {
            rel_type: rel_type.into(),
            property: property.into(),
            frequency,
        }
    }

    /// Relationship type name.
    pub fn rel_type(&self) -> &str {
        &self.rel_type
    }

    /// Property key.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Change frequency in `(0, 1]`.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }
}

impl PartialEq for PropertyChangeFrequency {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PropertyChangeFrequency {}

impl PartialOrd for PropertyChangeFrequency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropertyChangeFrequency {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .frequency
            .total_cmp(&self.frequency)
            .then_with(|| self.rel_type.cmp(&other.rel_type))
            .then_with(|| self.property.cmp(&other.property))
    }
}

#[derive(Default)]
struct TypeStats<'a> {
    degree: u64,
    keys: BTreeSet<&'a str>,
}

#[derive(Default)]
struct PropertyStats<'a> {
    values: FxHashSet<&'a Predicate>,
    generalized_weight: u64,
}

/// Ranks the properties of cached degrees by change frequency.
///
/// For each type and property, the frequency is the number of distinct
/// predicates seen (a missing property counts as undefined) plus the degree
/// already generalized to any value, divided by the type's degree plus one.
pub fn change_frequencies(degrees: &DegreeMap) -> Vec<PropertyChangeFrequency> {
    let mut types: BTreeMap<&str, TypeStats<'_>> = BTreeMap::new();
    for (description, count) in degrees {
        let stats = types.entry(description.rel_type()).or_default();
        stats.degree = stats.degree.saturating_add(*count);
        stats.keys.extend(description.properties().keys());
    }

    let mut properties: BTreeMap<(&str, &str), PropertyStats<'_>> = BTreeMap::new();
    for (description, count) in degrees {
        let rel_type = description.rel_type();
        let Some(stats) = types.get(rel_type) else {
            continue;
        };
        for &key in &stats.keys {
            let entry = properties.entry((rel_type, key)).or_default();
            match description.properties().get(key) {
                Predicate::Any => entry.generalized_weight = entry.generalized_weight.saturating_add(*count),
                predicate => {
                    entry.values.insert(predicate);
                }
            }
        }
    }

    let mut frequencies: Vec<PropertyChangeFrequency> = properties
        .into_iter()
        .filter_map(|((rel_type, key), stats)| {
            let degree = types.get(rel_type)?.degree;
            let frequency =
                (stats.values.len() as f64 + stats.generalized_weight as f64) / (degree as f64 + 1.0);
            Some(PropertyChangeFrequency::new(rel_type, key, frequency))
        })
        .collect();
    frequencies.sort();
    frequencies
}

/// Generalizes the most frequently changing properties first, so volatile
/// values such as timestamps are erased before stable ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeneralizeFrequentlyChanging;

impl GeneralizationStrategy for GeneralizeFrequentlyChanging {
    fn produce_generalization(&self, degrees: &DegreeMap) -> Option<RelationshipDescription> {
        let frequencies = change_frequencies(degrees);
        GeneralizationGenerator::new(degrees.keys().cloned(), frequencies).generate()
    }
}
