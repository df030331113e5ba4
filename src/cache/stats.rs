//! Cache Statistics Module
//!
//! Tracks lookups, lazy expirations and sweeper activity.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful lookups
    pub hits: u64,
    /// Number of failed lookups (absent or expired)
    pub misses: u64,
    /// Entries removed by a lookup that found them past their deadline
    pub expirations: u64,
    /// Number of sweeper firings
    pub sweeps: u64,
    /// Buckets dropped by the sweeper
    pub buckets_discarded: u64,
    /// Entries dropped together with those buckets
    pub entries_reclaimed: u64,
    /// Keys currently in the primary index
    pub live_keys: usize,
    /// Buckets currently held, empty ones included
    pub buckets: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Records a lookup that found its entry expired. Also counts as a miss.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
        self.misses += 1;
    }

    /// Records one sweeper firing and what it dropped.
    pub fn record_sweep(&mut self, buckets: usize, entries: usize) {
        self.sweeps += 1;
        self.buckets_discarded += buckets as u64;
        self.entries_reclaimed += entries as u64;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_expiration_counts_as_miss() {
        let mut stats = CacheStats::new();
        stats.record_expiration();

        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_record_sweep() {
        let mut stats = CacheStats::new();
        stats.record_sweep(0, 0);
        stats.record_sweep(2, 5);

        assert_eq!(stats.sweeps, 2);
        assert_eq!(stats.buckets_discarded, 2);
        assert_eq!(stats.entries_reclaimed, 5);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.live_keys = 4;

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["live_keys"], 4);
        assert_eq!(json["sweeps"], 0);
    }
}
