//! Relationship descriptions: a partial order over relationship patterns.
//!
//! A [`RelationshipDescription`] is a relationship type, a [`Direction`] and a
//! sparse map from property keys to [`Predicate`]s. Descriptions are immutable
//! values; [`RelationshipDescription::with`] returns a modified copy.

mod direction;
mod predicate;
mod properties;
mod relationship;

pub use direction::Direction;
pub use predicate::Predicate;
pub use properties::PropertiesDescription;
pub use relationship::RelationshipDescription;
