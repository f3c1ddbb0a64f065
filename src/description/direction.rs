use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{RelcountError, Result};
use crate::graph::Relationship;
use crate::types::NodeId;

/// Direction of a relationship as seen from one of its nodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The node is the start of the relationship.
    Outgoing,
    /// The node is the end of the relationship.
    Incoming,
    /// Either end.
    Both,
}

impl Direction {
    /// Whether `self` covers `other` in the description partial order.
    pub fn generalizes(self, other: Direction) -> bool {
        self == Direction::Both || self == other
    }

    /// Whether a relationship could satisfy both directions at once.
    pub fn matches(self, other: Direction) -> bool {
        self == Direction::Both || other == Direction::Both || self == other
    }

    /// Resolves the direction of `relationship` from `point_of_view`.
    ///
    /// Self-relationships resolve to `default_direction`.
    pub fn resolve(
        relationship: &Relationship,
        point_of_view: NodeId,
        default_direction: Direction,
    ) -> Result<Direction> {
        if relationship.start != point_of_view && relationship.end != point_of_view {
            return Err(RelcountError::invalid(format!(
                "relationship {} does not have node {} on either of its ends",
                relationship.id, point_of_view
            )));
        }
        if relationship.start == relationship.end {
            return Ok(default_direction);
        }
        if relationship.start == point_of_view {
            Ok(Direction::Outgoing)
        } else {
            Ok(Direction::Incoming)
        }
    }

    /// Default directions under which `point_of_view` counts `relationship`.
    ///
    /// The start end defaults to incoming and the end end to outgoing, so a
    /// self-relationship is counted once in each direction.
    pub fn endpoint_defaults(relationship: &Relationship, point_of_view: NodeId) -> SmallVec<[Direction; 2]> {
        let mut defaults = SmallVec::new();
        if relationship.start == point_of_view {
            defaults.push(Direction::Incoming);
        }
        if relationship.end == point_of_view {
            defaults.push(Direction::Outgoing);
        }
        defaults
    }

    /// Parses `out`, `in` or `both` (case-insensitive).
    pub fn parse(value: &str) -> Option<Direction> {
        match value.to_ascii_lowercase().as_str() {
            "out" | "outgoing" => Some(Direction::Outgoing),
            "in" | "incoming" => Some(Direction::Incoming),
            "both" => Some(Direction::Both),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Outgoing => "OUTGOING",
            Direction::Incoming => "INCOMING",
            Direction::Both => "BOTH",
        };
        f.write_str(name)
    }
}
