use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::predicate::{Predicate, ANY, UNDEFINED};
use crate::types::PropValue;

/// How keys without an explicit predicate are interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
enum PropertiesKind {
    /// Absent keys are [`Predicate::Undefined`].
    Literal,
    /// Absent keys are [`Predicate::Any`].
    Wildcard,
}

impl PropertiesKind {
    fn default_predicate(self) -> &'static Predicate {
        match self {
            PropertiesKind::Literal => &UNDEFINED,
            PropertiesKind::Wildcard => &ANY,
        }
    }
}

/// Sparse map of property predicates.
///
/// Only predicates that differ from the kind's default are stored, so two
/// descriptions denoting the same constraints are structurally equal.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct PropertiesDescription {
    kind: PropertiesKind,
    predicates: BTreeMap<String, Predicate>,
}

impl PropertiesDescription {
    /// Empty literal description: every property is undefined.
    pub fn literal() -> Self {
        Self {
            kind: PropertiesKind::Literal,
            predicates: BTreeMap::new(),
        }
    }

    /// Empty wildcard description: every property may hold any value.
    pub fn wildcard() -> Self {
        Self {
            kind: PropertiesKind::Wildcard,
            predicates: BTreeMap::new(),
        }
    }

    /// Most specific literal description of concrete property values.
    pub fn of_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a PropValue)>,
    {
        let mut description = Self::literal();
        for (key, value) in values {
            description.insert(key, Predicate::EqualTo(value.clone()));
        }
        description
    }

    /// Predicate constraining `key`, falling back to the kind default.
    pub fn get(&self, key: &str) -> &Predicate {
        self.predicates
            .get(key)
            .unwrap_or_else(|| self.kind.default_predicate())
    }

    /// Keys with an explicit predicate, in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.predicates.keys().map(String::as_str)
    }

    /// Explicit predicates, in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Predicate)> + '_ {
        self.predicates.iter().map(|(k, p)| (k.as_str(), p))
    }

    /// Returns a copy with `key` constrained by `predicate`.
    pub fn with(&self, key: &str, predicate: Predicate) -> Self {
        let mut copy = self.clone();
        copy.insert(key, predicate);
        copy
    }

    fn insert(&mut self, key: &str, predicate: Predicate) {
        if &predicate == self.kind.default_predicate() {
            self.predicates.remove(key);
        } else {
            self.predicates.insert(key.to_owned(), predicate);
        }
    }

    /// Whether `self` constrains properties no more than `other` does.
    pub fn is_more_general_than(&self, other: &PropertiesDescription) -> bool {
        if !self
            .kind
            .default_predicate()
            .is_more_general_than(other.kind.default_predicate())
        {
            return false;
        }
        self.union_keys(other)
            .all(|key| self.get(key).is_more_general_than(other.get(key)))
    }

    /// Inverse of [`PropertiesDescription::is_more_general_than`].
    pub fn is_more_specific_than(&self, other: &PropertiesDescription) -> bool {
        other.is_more_general_than(self)
    }

    /// Whether no set of property values can satisfy both descriptions.
    pub fn is_mutually_exclusive(&self, other: &PropertiesDescription) -> bool {
        self.union_keys(other)
            .any(|key| self.get(key).is_mutually_exclusive(other.get(key)))
    }

    fn union_keys<'a>(&'a self, other: &'a PropertiesDescription) -> impl Iterator<Item = &'a str> {
        self.keys()
            .chain(other.keys().filter(move |key| !self.predicates.contains_key(*key)))
    }
}

impl fmt::Display for PropertiesDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            PropertiesKind::Literal => "",
            PropertiesKind::Wildcard => "*",
        };
        write!(f, "{marker}{{")?;
        for (idx, (key, predicate)) in self.predicates.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            match predicate {
                Predicate::EqualTo(_) => write!(f, "{key}{predicate}")?,
                _ => write!(f, "{key} {predicate}")?,
            }
        }
        f.write_str("}")
    }
}
