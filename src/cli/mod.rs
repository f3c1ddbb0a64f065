//! Command-line support: replaying relationship events through the cache.

/// Event replay from CSV files.
pub mod replay;
