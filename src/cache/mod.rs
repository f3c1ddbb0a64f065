//! Write path of the relationship count cache.
//!
//! A [`NodeDegreeCache`] opens one [`CachingSession`] per unit of work. The
//! session keeps a [`DegreeCachingNode`] for every node it touches, and each
//! node loads its degrees through the configured [`DegreeCachingStrategy`]
//! at most once and writes them back once on commit.

mod node;
mod session;
mod strategy;

pub use node::DegreeCachingNode;
pub use session::{CachingSession, NodeDegreeCache};
pub use strategy::{DegreeCachingStrategy, DegreeMap, DescriptionSet, MemoryDegreeStore};
