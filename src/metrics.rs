use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking degree cache activity.
///
/// Implementations collect statistics about cache loads, flushes and
/// compaction so hosts can tell whether the configured threshold suits their
/// data.
pub trait CacheMetrics: Send + Sync {
    /// Records that a node's cached degrees were read from storage.
    fn degrees_loaded(&self, entries: usize);

    /// Records a flush of one node's cached degrees.
    fn degrees_flushed(&self, updated: usize, removed: usize);

    /// Records a compaction attempt on a node above its threshold.
    fn compaction_started(&self);

    /// Records one generalization merging `absorbed` entries into one.
    fn generalization_applied(&self, absorbed: usize);

    /// Records a compaction that could not reach its threshold.
    fn compaction_stuck(&self);

    /// Records a count served by the naive counter after the cache refused it.
    fn counter_fallback(&self);
}

/// A no-op implementation of [`CacheMetrics`] that discards all recorded metrics.
#[derive(Default)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    fn degrees_loaded(&self, _entries: usize) {}
    fn degrees_flushed(&self, _updated: usize, _removed: usize) {}
    fn compaction_started(&self) {}
    fn generalization_applied(&self, _absorbed: usize) {}
    fn compaction_stuck(&self) {}
    fn counter_fallback(&self) {}
}

/// A thread-safe counter-based implementation of [`CacheMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of node loads from storage.
    pub loads: AtomicU64,

    /// Total cached entries read across all loads.
    pub entries_loaded: AtomicU64,

    /// Number of node flushes.
    pub flushes: AtomicU64,

    /// Total entries written as updated.
    pub entries_updated: AtomicU64,

    /// Total entries written as removed.
    pub entries_removed: AtomicU64,

    /// Number of compaction attempts.
    pub compactions: AtomicU64,

    /// Number of generalizations applied.
    pub generalizations: AtomicU64,

    /// Total entries absorbed by generalizations.
    pub entries_absorbed: AtomicU64,

    /// Number of compactions that stopped above threshold.
    pub stuck: AtomicU64,

    /// Number of counts that fell back to the naive counter.
    pub fallbacks: AtomicU64,
}

impl CacheMetrics for CounterMetrics {
    fn degrees_loaded(&self, entries: usize) {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.entries_loaded
            .fetch_add(entries as u64, Ordering::Relaxed);
    }

    fn degrees_flushed(&self, updated: usize, removed: usize) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.entries_updated
            .fetch_add(updated as u64, Ordering::Relaxed);
        self.entries_removed
            .fetch_add(removed as u64, Ordering::Relaxed);
    }

    fn compaction_started(&self) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
    }

    fn generalization_applied(&self, absorbed: usize) {
        self.generalizations.fetch_add(1, Ordering::Relaxed);
        self.entries_absorbed
            .fetch_add(absorbed as u64, Ordering::Relaxed);
    }

    fn compaction_stuck(&self) {
        self.stuck.fetch_add(1, Ordering::Relaxed);
    }

    fn counter_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation wrapped in an [`Arc`].
pub fn default_metrics() -> Arc<dyn CacheMetrics> {
    Arc::new(NoopMetrics)
}
