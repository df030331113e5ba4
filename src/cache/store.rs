//! Cache Store Module
//!
//! Main cache engine: a primary index from key to bucket number, a bucket
//! store holding the entries, and a sweep cursor, all behind one lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::bucket::{bucket_number, BucketStore, DISABLED_BUCKET};
use crate::cache::{CacheStats, Clock, Entry, SystemClock, DEFAULT_TIMEOUT};
use crate::config::{normalize_interval, Config};
use crate::error::{CacheError, Result};
use crate::tasks::spawn_sweep_task;

// == Sweep Report ==
/// Outcome of one sweeper firing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Buckets dropped by this firing
    pub buckets_discarded: usize,
    /// Entries held by those buckets
    pub entries_reclaimed: usize,
    /// Sweep cursor after the firing
    pub cursor: u64,
}

// == Cache State ==
/// Everything guarded by the cache lock. The primary index and the bucket
/// store are only ever mutated together.
#[derive(Debug)]
pub(crate) struct CacheState<K, V> {
    /// Key -> bucket currently holding its entry
    index: HashMap<K, u64>,
    buckets: BucketStore<K, V>,
    sweep_interval: Option<Duration>,
    /// Oldest bucket number not yet reclaimed
    cursor: u64,
    stats: CacheStats,
}

impl<K, V> CacheState<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(sweep_interval: Option<Duration>, now: Duration) -> Self {
        Self {
            index: HashMap::new(),
            buckets: BucketStore::new(),
            sweep_interval,
            cursor: sweep_interval.map_or(0, |interval| bucket_number(now, interval)),
            stats: CacheStats::new(),
        }
    }

    fn bucket_for(&self, expire_at: Duration) -> u64 {
        self.sweep_interval
            .map_or(DISABLED_BUCKET, |interval| bucket_number(expire_at, interval))
    }

    pub(crate) fn set(
        &mut self,
        key: K,
        value: V,
        now: Duration,
        timeout: Duration,
    ) -> Duration {
        // Drop the previous entry first, it may live in another bucket
        self.remove_entry(&key);

        let entry = Entry::new(value, now, timeout);
        let expire_at = entry.expire_at;
        let number = self.bucket_for(expire_at);
        self.index.insert(key.clone(), number);
        self.buckets.insert(number, key, entry);
        expire_at
    }

    pub(crate) fn get(&mut self, key: &K, now: Duration) -> Result<V, K>
    where
        V: Clone,
    {
        let Some(&number) = self.index.get(key) else {
            self.stats.record_miss();
            return Err(CacheError::NotFound(key.clone()));
        };

        let expired = match self.buckets.get(number, key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                return Ok(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expiration();
            debug!(bucket = number, "Lazily expired entry on read");
        } else {
            self.drop_dangling(key, number);
            self.stats.record_miss();
        }
        Err(CacheError::NotFound(key.clone()))
    }

    pub(crate) fn delete(&mut self, key: &K) -> Result<(), K> {
        match self.index.get(key) {
            None => Err(CacheError::NotFound(key.clone())),
            Some(&number) => match self.remove_entry(key) {
                Some(_) => Ok(()),
                None => {
                    self.drop_dangling(key, number);
                    Err(CacheError::NotFound(key.clone()))
                }
            },
        }
    }

    /// Removes `key` from both the index and its bucket.
    fn remove_entry(&mut self, key: &K) -> Option<Entry<V>> {
        let number = self.index.remove(key)?;
        self.buckets.remove(number, key)
    }

    /// Cleans up an index entry whose bucket entry is missing.
    fn drop_dangling(&mut self, key: &K, number: u64) {
        self.index.remove(key);
        error!(
            bucket = number,
            "Primary index referenced a missing bucket entry"
        );
        debug_assert!(false, "primary index out of sync with bucket {number}");
    }

    pub(crate) fn sweep(&mut self, now: Duration) -> SweepReport {
        let Some(interval) = self.sweep_interval else {
            return SweepReport::default();
        };

        let current = bucket_number(now, interval);
        let mut report = SweepReport {
            cursor: self.cursor,
            ..SweepReport::default()
        };

        if current > self.cursor {
            for (number, bucket) in self.buckets.discard_range(self.cursor, current) {
                report.buckets_discarded += 1;
                report.entries_reclaimed += bucket.len();
                for key in bucket.into_keys() {
                    if self.index.get(&key) == Some(&number) {
                        self.index.remove(&key);
                    }
                }
            }
            self.cursor = current;
            report.cursor = current;
        }

        self.stats
            .record_sweep(report.buckets_discarded, report.entries_reclaimed);
        report
    }

    pub(crate) fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.live_keys = self.index.len();
        stats.buckets = self.buckets.len();
        stats
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn cursor(&self) -> u64 {
        self.cursor
    }
}

// == Expiring Cache ==
/// Key-value cache whose entries expire after a per-entry timeout.
///
/// Reads check each entry's exact deadline. When a sweep interval is set, a
/// background Tokio task also drops whole buckets of expired entries once
/// their window has passed. The task is cancelled by [`dispose`] or on drop.
///
/// [`dispose`]: ExpiringCache::dispose
pub struct ExpiringCache<K, V> {
    state: Arc<Mutex<CacheState<K, V>>>,
    clock: Arc<dyn Clock>,
    sweep_interval: Option<Duration>,
    default_timeout: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Creates a cache on the system clock with the default entry timeout.
    ///
    /// `None` or a zero interval disables background sweeping. Sweeping
    /// needs a Tokio runtime; without one the sweeper stays idle.
    pub fn new(sweep_interval: Option<Duration>) -> Self {
        Self::with_clock(sweep_interval, DEFAULT_TIMEOUT, Arc::new(SystemClock))
    }

    /// Creates a cache from loaded configuration, on the system clock.
    pub fn from_config(config: &Config) -> Self {
        Self::with_clock(
            config.sweep_interval,
            config.default_timeout,
            Arc::new(SystemClock),
        )
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(
        sweep_interval: Option<Duration>,
        default_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sweep_interval = normalize_interval(sweep_interval);
        let state = Arc::new(Mutex::new(CacheState::new(sweep_interval, clock.now())));

        let sweeper = sweep_interval.and_then(|interval| {
            if Handle::try_current().is_ok() {
                Some(spawn_sweep_task(state.clone(), clock.clone(), interval))
            } else {
                warn!("No Tokio runtime available, background sweeping disabled");
                None
            }
        });

        Self {
            state,
            clock,
            sweep_interval,
            default_timeout,
            sweeper: Mutex::new(sweeper),
        }
    }

    // == Set ==
    /// Stores `value` under `key`, expiring after `timeout` (the cache's
    /// default timeout if `None`). Replaces any previous entry for `key`.
    ///
    /// Returns the absolute deadline the entry was stored with.
    pub fn set(&self, key: K, value: V, timeout: Option<Duration>) -> Duration {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let now = self.clock.now();
        self.state.lock().set(key, value, now, timeout)
    }

    // == Get ==
    /// Returns a copy of the value stored under `key`.
    ///
    /// Fails with `NotFound` if the key is absent or its deadline has
    /// passed; an expired entry is removed on the way out.
    pub fn get(&self, key: &K) -> Result<V, K> {
        let now = self.clock.now();
        self.state.lock().get(key, now)
    }

    // == Delete ==
    /// Removes `key`. Fails with `NotFound` if it is not present.
    pub fn delete(&self, key: &K) -> Result<(), K> {
        self.state.lock().delete(key)
    }

    // == Sweep ==
    /// Runs one sweep now: drops every bucket whose window has fully
    /// elapsed. Does nothing when sweeping is disabled.
    pub fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        self.state.lock().sweep(now)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats()
    }

    /// Returns the number of keys in the primary index. Keys past their
    /// deadline count until they are read or swept.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Oldest bucket number not yet reclaimed.
    pub fn sweep_cursor(&self) -> u64 {
        self.state.lock().cursor()
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Reads the cache's clock.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }
}

impl<K, V> ExpiringCache<K, V> {
    // == Dispose ==
    /// Cancels the background sweeper. Safe to call more than once.
    pub fn dispose(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            info!("Sweeper cancelled");
        }
    }

    /// Returns true while a background sweeper is scheduled.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<K, V> Drop for ExpiringCache<K, V> {
    fn drop(&mut self) {
        self.dispose();
    }
}
