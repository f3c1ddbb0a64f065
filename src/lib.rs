//! Relationship degree cache with adaptive compaction.
//!
//! Every node keeps counts of its relationships keyed by
//! [`RelationshipDescription`] patterns. When a node accumulates more distinct
//! patterns than the configured threshold, specific patterns are merged into
//! more general ones, preserving the total count.

#![warn(missing_docs)]

pub mod cache;
pub mod cli;
pub mod compact;
pub mod config;
pub mod count;
pub mod description;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod types;

pub use cache::{
    CachingSession, DegreeCachingNode, DegreeCachingStrategy, DegreeMap, MemoryDegreeStore,
    NodeDegreeCache,
};
pub use compact::{CompactionState, CompactionStrategy, ThresholdBasedCompactionStrategy};
pub use config::{RelcountConfig, RelcountSettings};
pub use count::{
    CachedRelationshipCounter, FallbackRelationshipCounter, NaiveRelationshipCounter,
    RelationshipCounter,
};
pub use description::{Direction, Predicate, PropertiesDescription, RelationshipDescription};
pub use error::{RelcountError, Result};
pub use graph::{MemoryGraph, Relationship, RelationshipSource};
pub use types::{NodeId, PropValue, RelationshipId};
