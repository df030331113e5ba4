//! Bucket Store Module
//!
//! Groups entries by the sweep window their deadline falls into, so a whole
//! window can be dropped at once after it has elapsed.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::cache::Entry;

/// Bucket number shared by every entry when sweeping is disabled.
pub const DISABLED_BUCKET: u64 = 0;

/// Entries whose deadlines fall into one sweep window.
pub type Bucket<K, V> = HashMap<K, Entry<V>>;

// == Bucket Number ==
/// Returns `floor(instant / interval)`, saturating at `u64::MAX`.
///
/// `interval` must be non-zero.
pub fn bucket_number(instant: Duration, interval: Duration) -> u64 {
    debug_assert!(!interval.is_zero(), "bucket interval must be non-zero");
    let width = interval.as_nanos().max(1);
    u64::try_from(instant.as_nanos() / width).unwrap_or(u64::MAX)
}

// == Bucket Store ==
/// Map from bucket number to the entries it holds.
#[derive(Debug)]
pub struct BucketStore<K, V> {
    buckets: HashMap<u64, Bucket<K, V>>,
}

impl<K, V> Default for BucketStore<K, V> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }
}

impl<K, V> BucketStore<K, V>
where
    K: Eq + Hash,
{
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Stores `entry` under `key` in bucket `number`, creating the bucket on
    /// first use. Returns the entry it replaced in that bucket, if any.
    pub fn insert(&mut self, number: u64, key: K, entry: Entry<V>) -> Option<Entry<V>> {
        self.buckets.entry(number).or_default().insert(key, entry)
    }

    // == Get ==
    /// Looks up `key` in bucket `number`.
    pub fn get(&self, number: u64, key: &K) -> Option<&Entry<V>> {
        self.buckets.get(&number)?.get(key)
    }

    // == Remove ==
    /// Removes `key` from bucket `number`. An emptied bucket is kept until
    /// it is swept.
    pub fn remove(&mut self, number: u64, key: &K) -> Option<Entry<V>> {
        self.buckets.get_mut(&number)?.remove(key)
    }

    // == Discard Range ==
    /// Drops every bucket numbered in `[from, to)` and hands them back.
    ///
    /// Bucket numbers with no bucket are skipped. When the range is wider
    /// than the number of stored buckets only the stored ones are visited.
    pub fn discard_range(&mut self, from: u64, to: u64) -> Vec<(u64, Bucket<K, V>)> {
        if from >= to {
            return Vec::new();
        }

        let numbers: Vec<u64> = if to - from > self.buckets.len() as u64 {
            self.buckets
                .keys()
                .copied()
                .filter(|n| (from..to).contains(n))
                .collect()
        } else {
            (from..to).collect()
        };

        numbers
            .into_iter()
            .filter_map(|n| self.buckets.remove(&n).map(|bucket| (n, bucket)))
            .collect()
    }

    // == Length ==
    /// Returns the number of buckets, empty ones included.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    // == Is Empty ==
    /// Returns true if no bucket exists.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Returns the number of entries across all buckets.
    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(HashMap::len).sum()
    }
}
