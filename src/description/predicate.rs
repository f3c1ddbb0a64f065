use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::PropValue;

/// Constraint on the value of a single relationship property.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches any value, including an absent one.
    Any,
    /// Matches only an absent property.
    Undefined,
    /// Matches exactly the given value.
    EqualTo(PropValue),
}

pub(crate) static ANY: Predicate = Predicate::Any;
pub(crate) static UNDEFINED: Predicate = Predicate::Undefined;

impl Predicate {
    /// Shorthand for [`Predicate::EqualTo`].
    pub fn equal_to(value: impl Into<PropValue>) -> Self {
        Predicate::EqualTo(value.into())
    }

    /// Whether every value matched by `other` is matched by `self`.
    pub fn is_more_general_than(&self, other: &Predicate) -> bool {
        match (self, other) {
            (Predicate::Any, _) => true,
            (Predicate::Undefined, Predicate::Undefined) => true,
            (Predicate::EqualTo(a), Predicate::EqualTo(b)) => a == b,
            _ => false,
        }
    }

    /// Inverse of [`Predicate::is_more_general_than`].
    pub fn is_more_specific_than(&self, other: &Predicate) -> bool {
        other.is_more_general_than(self)
    }

    /// Whether no value can satisfy both predicates.
    pub fn is_mutually_exclusive(&self, other: &Predicate) -> bool {
        match (self, other) {
            (Predicate::Any, _) | (_, Predicate::Any) => false,
            (Predicate::Undefined, Predicate::Undefined) => false,
            (Predicate::EqualTo(a), Predicate::EqualTo(b)) => a != b,
            _ => true,
        }
    }

    /// Evaluates the predicate against a property value; `None` means absent.
    pub fn evaluate(&self, value: Option<&PropValue>) -> bool {
        match (self, value) {
            (Predicate::Any, _) => true,
            (Predicate::Undefined, None) => true,
            (Predicate::EqualTo(expected), Some(actual)) => expected == actual,
            _ => false,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Any => f.write_str("ANY"),
            Predicate::Undefined => f.write_str("UNDEF"),
            Predicate::EqualTo(value) => write!(f, "={value}"),
        }
    }
}
