use std::fmt;

use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::predicate::Predicate;
use super::properties::PropertiesDescription;
use crate::error::{RelcountError, Result};
use crate::graph::Relationship;
use crate::types::NodeId;

/// Immutable pattern denoting a set of relationships of one node: a type, a
/// direction and constraints on properties.
///
/// Descriptions form a partial order. `a.is_more_specific_than(&b)` holds when
/// every relationship matched by `a` is also matched by `b`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct RelationshipDescription {
    rel_type: String,
    direction: Direction,
    properties: PropertiesDescription,
}

impl RelationshipDescription {
    /// Description whose unconstrained properties must be absent.
    pub fn literal(rel_type: impl Into<String>, direction: Direction) -> Result<Self> {
        Self::new(rel_type, direction, PropertiesDescription::literal())
    }

    /// Description whose unconstrained properties may hold anything.
    pub fn wildcard(rel_type: impl Into<String>, direction: Direction) -> Result<Self> {
        Self::new(rel_type, direction, PropertiesDescription::wildcard())
    }

    /// Builds a description from its parts, rejecting an empty type.
    pub fn new(
        rel_type: impl Into<String>,
        direction: Direction,
        properties: PropertiesDescription,
    ) -> Result<Self> {
        let rel_type = rel_type.into();
        if rel_type.is_empty() {
            return Err(RelcountError::invalid("relationship type must not be empty"));
        }
        Ok(Self {
            rel_type,
            direction,
            properties,
        })
    }

    /// Most specific description of `relationship` from `point_of_view`.
    ///
    /// Every property becomes an [`Predicate::EqualTo`] constraint; absent
    /// properties stay undefined. Self-relationships take `default_direction`.
    pub fn from_relationship(
        relationship: &Relationship,
        point_of_view: NodeId,
        default_direction: Direction,
    ) -> Result<Self> {
        let direction = Direction::resolve(relationship, point_of_view, default_direction)?;
        let properties = PropertiesDescription::of_values(
            relationship
                .properties
                .iter()
                .map(|(key, value)| (key.as_str(), value)),
        );
        Self::new(relationship.rel_type.clone(), direction, properties)
    }

    /// Relationship type name.
    pub fn rel_type(&self) -> &str {
        &self.rel_type
    }

    /// Direction from the owning node's point of view.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Property constraints.
    pub fn properties(&self) -> &PropertiesDescription {
        &self.properties
    }

    /// Returns a copy with `key` constrained by `predicate`.
    pub fn with(&self, key: &str, predicate: Predicate) -> Self {
        Self {
            rel_type: self.rel_type.clone(),
            direction: self.direction,
            properties: self.properties.with(key, predicate),
        }
    }

    /// Whether every relationship matched by `self` is matched by `other`.
    pub fn is_more_specific_than(&self, other: &RelationshipDescription) -> bool {
        self.rel_type == other.rel_type
            && other.direction.generalizes(self.direction)
            && self.properties.is_more_specific_than(&other.properties)
    }

    /// Inverse of [`RelationshipDescription::is_more_specific_than`].
    pub fn is_more_general_than(&self, other: &RelationshipDescription) -> bool {
        other.is_more_specific_than(self)
    }

    /// Whether no relationship can be matched by both descriptions.
    pub fn is_mutually_exclusive(&self, other: &RelationshipDescription) -> bool {
        self.rel_type != other.rel_type
            || !self.direction.matches(other.direction)
            || self.properties.is_mutually_exclusive(&other.properties)
    }

    /// Whether `relationship`, seen from `point_of_view`, is matched.
    pub fn matches(&self, relationship: &Relationship, point_of_view: NodeId) -> bool {
        if relationship.rel_type != self.rel_type {
            return false;
        }
        let resolved = match Direction::resolve(relationship, point_of_view, Direction::Both) {
            Ok(direction) => direction,
            Err(_) => return false,
        };
        if !resolved.matches(self.direction) {
            return false;
        }
        let constrained = self
            .properties
            .iter()
            .all(|(key, predicate)| predicate.evaluate(relationship.properties.get(key)));
        let unconstrained = relationship
            .properties
            .iter()
            .filter(|(key, _)| !self.properties.keys().any(|k| k == key.as_str()))
            .all(|(key, value)| self.properties.get(key).evaluate(Some(value)));
        constrained && unconstrained
    }
}

impl fmt::Display for RelationshipDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}#{}", self.rel_type, self.direction, self.properties)
    }
}
