use rustc_hash::FxHashSet;

use crate::graph::Relationship;

/// Decides which relationships, and which of their properties, are counted.
pub trait RelationshipInclusion: Send + Sync {
    /// Whether `relationship` contributes to cached degrees at all.
    fn include_relationship(&self, relationship: &Relationship) -> bool;

    /// Whether property `key` of `relationship` is kept in its description.
    fn include_property(&self, key: &str, relationship: &Relationship) -> bool;
}

/// Counts every relationship with every property.
#[derive(Clone, Copy, Debug, Default)]
pub struct IncludeAll;

impl RelationshipInclusion for IncludeAll {
    fn include_relationship(&self, _relationship: &Relationship) -> bool {
        true
    }

    fn include_property(&self, _key: &str, _relationship: &Relationship) -> bool {
        true
    }
}

/// Exclusion lists for relationship types and property keys.
#[derive(Clone, Debug, Default)]
pub struct InclusionRules {
    excluded_types: FxHashSet<String>,
    excluded_properties: FxHashSet<String>,
}

impl InclusionRules {
    /// Creates rules that include everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes relationships of `rel_type`.
    pub fn exclude_type(mut self, rel_type: impl Into<String>) -> Self {
        self.excluded_types.insert(rel_type.into());
        self
    }

    /// Drops property `key` from every description.
    pub fn exclude_property(mut self, key: impl Into<String>) -> Self {
        self.excluded_properties.insert(key.into());
        self
    }
}

impl RelationshipInclusion for InclusionRules {
    fn include_relationship(&self, relationship: &Relationship) -> bool {
        !self.excluded_types.contains(&relationship.rel_type)
    }

    fn include_property(&self, key: &str, _relationship: &Relationship) -> bool {
        !self.excluded_properties.contains(key)
    }
}
