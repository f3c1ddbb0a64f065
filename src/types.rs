//! Identifier and property value types shared by the cache and its collaborators.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Identity of a graph node whose degrees are cached.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Identity of a relationship in the host graph.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct RelationshipId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}

impl From<u64> for RelationshipId {
    fn from(value: u64) -> Self {
        RelationshipId(value)
    }
}

/// Owned relationship property value.
///
/// Equality, hashing and ordering are total: floats compare by bit pattern for
/// equality and by [`f64::total_cmp`] for ordering, so values can take part in
/// hashed and ordered keys.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PropValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Owned string.
    Str(String),
    /// Owned byte vector.
    Bytes(Vec<u8>),
    /// Date value represented as Unix timestamp (days since epoch).
    Date(i64),
    /// DateTime value represented as Unix timestamp (milliseconds since epoch).
    DateTime(i64),
}

impl PropValue {
    fn rank(&self) -> u8 {
        match self {
            PropValue::Null => 0,
            PropValue::Bool(_) => 1,
            PropValue::Int(_) => 2,
            PropValue::Float(_) => 3,
            PropValue::Str(_) => 4,
            PropValue::Bytes(_) => 5,
            PropValue::Date(_) => 6,
            PropValue::DateTime(_) => 7,
        }
    }

    /// Returns the value as an integer when it holds one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Bytes(a), PropValue::Bytes(b)) => a == b,
            (PropValue::Date(a), PropValue::Date(b)) => a == b,
            (PropValue::DateTime(a), PropValue::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PropValue {}

impl Hash for PropValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            PropValue::Null => {}
            PropValue::Bool(v) => v.hash(state),
            PropValue::Int(v) | PropValue::Date(v) | PropValue::DateTime(v) => v.hash(state),
            PropValue::Float(v) => v.to_bits().hash(state),
            PropValue::Str(v) => v.hash(state),
            PropValue::Bytes(v) => v.hash(state),
        }
    }
}

impl Ord for PropValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PropValue::Bool(a), PropValue::Bool(b)) => a.cmp(b),
            (PropValue::Int(a), PropValue::Int(b))
            | (PropValue::Date(a), PropValue::Date(b))
            | (PropValue::DateTime(a), PropValue::DateTime(b)) => a.cmp(b),
            (PropValue::Float(a), PropValue::Float(b)) => a.total_cmp(b),
            (PropValue::Str(a), PropValue::Str(b)) => a.cmp(b),
            (PropValue::Bytes(a), PropValue::Bytes(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for PropValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "null"),
            PropValue::Bool(v) => write!(f, "{v}"),
            PropValue::Int(v) => write!(f, "{v}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Str(v) => write!(f, "{v}"),
            PropValue::Bytes(v) => write!(f, "bytes(len={})", v.len()),
            PropValue::Date(v) => write!(f, "date({v})"),
            PropValue::DateTime(v) => write!(f, "datetime({v})"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}
