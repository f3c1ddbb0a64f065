use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::NodeId;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RelcountError>;

/// Errors surfaced by the relationship count cache.
#[derive(Debug, Error)]
pub enum RelcountError {
    /// The cached degrees of a node are out of sync with the graph. The owning
    /// module must rebuild its cache; this is not a bug in the cache itself.
    #[error("cached degrees of node {node} need initialization: {reason}")]
    NeedsInitialization {
        /// Node whose cache is out of sync.
        node: NodeId,
        /// Human readable description of the mismatch.
        reason: String,
    },
    /// An argument was rejected at the call that introduced it.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The cache no longer holds the granularity needed to answer a count.
    #[error("unable to count: {0}")]
    UnableToCount(String),
    /// The degree storage collaborator failed.
    #[error("storage error: {0}")]
    Storage(String),
    /// A settings file could not be read.
    #[error("failed to read settings {path}: {source}")]
    ConfigRead {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A settings file could not be parsed.
    #[error("failed to parse settings {path}: {source}")]
    ConfigParse {
        /// Path of the settings file (empty when parsed from a string).
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

impl RelcountError {
    /// Returns true when the owning module should rebuild the cache.
    pub fn needs_initialization(&self) -> bool {
        matches!(self, RelcountError::NeedsInitialization { .. })
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        RelcountError::InvalidArgument(message.into())
    }
}
