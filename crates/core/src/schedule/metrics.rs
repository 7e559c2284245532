//! Coverage metrics for the range cache
//!
//! Tracks how often `ensure_coverage` was answered from the materialized
//! window (hit) versus by a union fetch (miss), plus failed fetches.
//!
//! ## Design
//! - **SeqCst ordering** for atomics used in hit_rate calculation (derived metric)
//! - **No locking needed** - simple atomic counters

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for range cache behaviour
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Requests answered without a network call
    pub coverage_hits: AtomicUsize,
    /// Requests that needed a fetch
    pub coverage_misses: AtomicUsize,
    /// Refetches of the current window
    pub refetches: AtomicUsize,
    /// Fetches that failed and left the cache untouched
    pub fetch_failures: AtomicUsize,
}

impl CacheMetrics {
    /// All counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request already covered by the cache.
    pub fn record_hit(&self) {
        self.coverage_hits.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a request that needed a fetch.
    pub fn record_miss(&self) {
        self.coverage_misses.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a refresh of the current window.
    pub fn record_refetch(&self) {
        self.refetches.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a fetch that failed.
    pub fn record_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::SeqCst);
    }

    /// Calculate coverage hit rate as a percentage (0.0 to 100.0)
    ///
    /// Returns 0.0 if no coverage requests have been recorded.
    ///
    /// ## Calculation
    /// ```text
    /// hit_rate = (hits / (hits + misses)) * 100.0
    /// ```
    pub fn get_hit_rate(&self) -> f64 {
        let hits = self.coverage_hits.load(Ordering::SeqCst);
        let misses = self.coverage_misses.load(Ordering::SeqCst);

        let total = hits + misses;
        if total == 0 {
            return 0.0;
        }

        (hits as f64 / total as f64) * 100.0
    }

    /// Covered requests so far.
    pub fn get_hits(&self) -> usize {
        self.coverage_hits.load(Ordering::SeqCst)
    }

    /// Requests that fetched so far.
    pub fn get_misses(&self) -> usize {
        self.coverage_misses.load(Ordering::SeqCst)
    }

    /// Refreshes so far.
    pub fn get_refetches(&self) -> usize {
        self.refetches.load(Ordering::SeqCst)
    }

    /// Failed fetches so far.
    pub fn get_failures(&self) -> usize {
        self.fetch_failures.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let metrics = CacheMetrics::new();
        assert_eq!(metrics.get_hits(), 0);
        assert_eq!(metrics.get_misses(), 0);
        assert_eq!(metrics.get_refetches(), 0);
        assert_eq!(metrics.get_failures(), 0);
        assert_eq!(metrics.get_hit_rate(), 0.0);
    }

    #[test]
    fn test_get_hit_rate() {
        let metrics = CacheMetrics::new();

        // 3 hits, 1 miss = 75% hit rate
        for _ in 0..3 {
            metrics.record_hit();
        }
        metrics.record_miss();

        assert_eq!(metrics.get_hit_rate(), 75.0);
    }

    #[test]
    fn refetches_and_failures_do_not_affect_hit_rate() {
        let metrics = CacheMetrics::new();
        metrics.record_hit();
        metrics.record_refetch();
        metrics.record_failure();

        assert_eq!(metrics.get_hit_rate(), 100.0);
        assert_eq!(metrics.get_refetches(), 1);
        assert_eq!(metrics.get_failures(), 1);
    }
}
