//! Cache statistics and metrics tracking
//!
//! Counters are only updated when the cache was built with
//! `track_metrics = true`; otherwise every snapshot reports zeros apart from
//! the live entry count.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time statistics for a cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries, including expired ones not yet swept
    pub size: usize,

    /// Lookups that found the key
    pub hits: u64,

    /// Lookups that did not find the key
    pub misses: u64,

    /// Entries written by `insert` or by a `get_or_insert` miss
    pub inserts: u64,

    /// Entries removed explicitly through `remove`
    pub removals: u64,

    /// Entries removed by a sweep
    pub expirations: u64,

    /// Completed sweeps, manual or automatic
    pub sweeps: u64,

    /// Calls to `clear`
    pub clears: u64,
}

impl CacheStats {
    /// Calculate hit rate (hits / total lookups)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate miss rate (misses / total lookups)
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }

    /// Total number of lookups (hits + misses)
    pub fn total_lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Lock-free counters behind [`CacheStats`]
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    removals: AtomicU64,
    expirations: AtomicU64,
    sweeps: AtomicU64,
    clears: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a lookup outcome
    pub(crate) fn record_lookup(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one finished sweep and how many entries it expired
    pub(crate) fn record_sweep(&self, expired: usize) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.expirations.fetch_add(expired as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub(crate) fn snapshot(&self, size: usize) -> CacheStats {
        CacheStats {
            size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::stats.
    use std::sync::Arc;
    use std::thread;

    use super::*;

    /// Validates `Default::default` behavior for the hit rate calculation
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures `(stats.hit_rate() - 0.8).abs() < 1e-10` evaluates to true.
    /// - Ensures `(stats.miss_rate() - 0.2).abs() < 1e-10` evaluates to true.
    /// - Confirms `stats.total_lookups()` equals `100`.
    #[test]
    fn test_hit_rate_calculation() {
        let stats = CacheStats { hits: 80, misses: 20, ..Default::default() };

        assert!((stats.hit_rate() - 0.8).abs() < 1e-10);
        assert!((stats.miss_rate() - 0.2).abs() < 1e-10);
        assert_eq!(stats.total_lookups(), 100);
    }

    /// Validates `CacheStats::default` behavior for the hit rate no lookups
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `stats.hit_rate()` equals `0.0`.
    /// - Confirms `stats.miss_rate()` equals `1.0`.
    #[test]
    fn test_hit_rate_no_lookups() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.miss_rate(), 1.0);
        assert_eq!(stats.total_lookups(), 0);
    }

    /// Validates `MetricsCollector::new` behavior for the metrics collector
    /// record operations scenario.
    ///
    /// Assertions:
    /// - Confirms each counter reflects exactly the recorded events.
    /// - Confirms `stats.size` equals the size passed to `snapshot`.
    #[test]
    fn test_metrics_collector_record_operations() {
        let collector = MetricsCollector::new();

        collector.record_lookup(true);
        collector.record_lookup(true);
        collector.record_lookup(false);
        collector.record_insert();
        collector.record_removal();
        collector.record_sweep(3);
        collector.record_sweep(0);
        collector.record_clear();

        let stats = collector.snapshot(7);

        assert_eq!(stats.size, 7);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.removals, 1);
        assert_eq!(stats.expirations, 3);
        assert_eq!(stats.sweeps, 2);
        assert_eq!(stats.clears, 1);
    }

    /// Validates `Arc::new` behavior for the metrics collector thread safety
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `stats.hits` equals `1000`.
    #[test]
    fn test_metrics_collector_thread_safety() {
        let collector = Arc::new(MetricsCollector::new());
        let mut handles = vec![];

        // Spawn 10 threads, each recording 100 hits
        for _ in 0..10 {
            let collector_clone = Arc::clone(&collector);
            let handle = thread::spawn(move || {
                for _ in 0..100 {
                    collector_clone.record_lookup(true);
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = collector.snapshot(0);
        assert_eq!(stats.hits, 1000);
        assert_eq!(stats.misses, 0);
    }
}
