//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against its expiry and indexing rules,
//! driving time through a `ManualClock`.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Clock, ExpiringCache, ManualClock, DEFAULT_TIMEOUT};
use crate::error::CacheError;

// == Test Configuration ==
const START: Duration = Duration::from_secs(1_700_000_000);
const INTERVAL: Duration = Duration::from_secs(1);

fn cache_with(interval: Option<Duration>) -> (ExpiringCache<String, String>, ManualClock) {
    let clock = ManualClock::new(START);
    let cache = ExpiringCache::with_clock(interval, DEFAULT_TIMEOUT, Arc::new(clock.clone()));
    (cache, clock)
}

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,32}".prop_map(|s| s)
}

/// Timeouts between 1 ms and 10 s
fn timeout_strategy() -> impl Strategy<Value = Duration> {
    (1u64..10_000).prop_map(Duration::from_millis)
}

fn interval_strategy() -> impl Strategy<Value = Option<Duration>> {
    prop_oneof![
        Just(None),
        (1u64..3_000).prop_map(|ms| Some(Duration::from_millis(ms))),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set {
        key: String,
        value: String,
        timeout: Duration,
    },
    Get {
        key: String,
    },
    Delete {
        key: String,
    },
    Advance {
        by: Duration,
    },
    Sweep,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy(), timeout_strategy())
            .prop_map(|(key, value, timeout)| CacheOp::Set { key, value, timeout }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
        (0u64..4_000).prop_map(|ms| CacheOp::Advance {
            by: Duration::from_millis(ms)
        }),
        Just(CacheOp::Sweep),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Immediately after set, get returns the stored value.
    #[test]
    fn prop_roundtrip_storage(
        interval in interval_strategy(),
        key in key_strategy(),
        value in value_strategy(),
        timeout in timeout_strategy()
    ) {
        let (cache, _) = cache_with(interval);

        cache.set(key.clone(), value.clone(), Some(timeout));

        prop_assert_eq!(cache.get(&key), Ok(value));
    }

    // Once the timeout has elapsed, get reports NotFound whether or not a
    // sweep ran in between.
    #[test]
    fn prop_expiry_after_timeout(
        interval in interval_strategy(),
        key in key_strategy(),
        value in value_strategy(),
        timeout in timeout_strategy(),
        extra in 0u64..5_000,
        sweep_first in any::<bool>()
    ) {
        let (cache, clock) = cache_with(interval);
        cache.set(key.clone(), value, Some(timeout));

        clock.advance(timeout + Duration::from_millis(extra));
        if sweep_first {
            cache.sweep();
        }

        prop_assert_eq!(cache.get(&key), Err(CacheError::NotFound(key.clone())));
        prop_assert!(cache.is_empty());
    }

    // Overwriting leaves exactly one live mapping, holding the newest value
    // and the newest deadline.
    #[test]
    fn prop_overwrite_semantics(
        interval in interval_strategy(),
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy(),
        timeout1 in timeout_strategy(),
        timeout2 in timeout_strategy()
    ) {
        let (cache, clock) = cache_with(interval);

        cache.set(key.clone(), value1, Some(timeout1));
        cache.set(key.clone(), value2.clone(), Some(timeout2));

        prop_assert_eq!(cache.get(&key), Ok(value2));
        prop_assert_eq!(cache.len(), 1);

        cache.delete(&key).unwrap();
        clock.advance(timeout1.min(timeout2) / 2);
        prop_assert!(cache.get(&key).is_err(), "no ghost of the first value survives");
    }

    // Delete removes a present key and refuses an absent one.
    #[test]
    fn prop_delete_semantics(
        interval in interval_strategy(),
        key in key_strategy(),
        value in value_strategy()
    ) {
        let (cache, _) = cache_with(interval);

        prop_assert_eq!(cache.delete(&key), Err(CacheError::NotFound(key.clone())));

        cache.set(key.clone(), value, None);
        prop_assert_eq!(cache.delete(&key), Ok(()));
        prop_assert!(cache.get(&key).is_err());
        prop_assert!(cache.delete(&key).is_err());
    }

    // Any interleaving of operations, clock moves and sweeps agrees with a
    // plain map of (value, deadline).
    #[test]
    fn prop_matches_reference_model(
        interval in interval_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..60)
    ) {
        let (cache, clock) = cache_with(interval);
        let mut model: HashMap<String, (String, Duration)> = HashMap::new();

        for op in ops {
            let now = clock.now();
            match op {
                CacheOp::Set { key, value, timeout } => {
                    model.insert(key.clone(), (value.clone(), now + timeout));
                    cache.set(key, value, Some(timeout));
                }
                CacheOp::Get { key } => {
                    let live = model
                        .get(&key)
                        .filter(|(_, deadline)| now < *deadline)
                        .map(|(value, _)| value.clone());
                    let expected = match live {
                        Some(value) => Ok(value),
                        None => {
                            model.remove(&key);
                            Err(CacheError::NotFound(key.clone()))
                        }
                    };
                    prop_assert_eq!(cache.get(&key), expected);
                }
                CacheOp::Delete { key } => {
                    // Delete succeeds for entries still indexed: live ones,
                    // and expired ones nobody has read or swept yet
                    let result = cache.delete(&key);
                    match model.remove(&key) {
                        Some((_, deadline)) if now < deadline => prop_assert_eq!(result, Ok(())),
                        Some(_) => {}
                        None => prop_assert!(result.is_err()),
                    }
                }
                CacheOp::Advance { by } => clock.advance(by),
                CacheOp::Sweep => {
                    cache.sweep();
                }
            }

            // Swept or lazily expired keys only ever leave the index
            prop_assert!(cache.len() <= model.len());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // With sweeping enabled, after the clock passes several intervals and a
    // sweep runs, every timed-out key is gone and every live key still reads.
    #[test]
    fn prop_bulk_reclamation(
        entries in prop::collection::vec((key_strategy(), value_strategy(), timeout_strategy()), 1..40),
        steps in 1u32..12
    ) {
        let (cache, clock) = cache_with(Some(INTERVAL));
        let mut latest: HashMap<String, (String, Duration)> = HashMap::new();
        for (key, value, timeout) in entries {
            cache.set(key.clone(), value.clone(), Some(timeout));
            latest.insert(key, (value, timeout));
        }

        let elapsed = INTERVAL * steps;
        clock.advance(elapsed);
        cache.sweep();

        for (key, (value, timeout)) in &latest {
            if *timeout <= elapsed {
                prop_assert!(cache.get(key).is_err(), "{} should have expired", key);
            } else {
                prop_assert_eq!(cache.get(key), Ok(value.clone()));
            }
        }

        // Everything left in the index after the reads is still live
        let stats = cache.stats();
        prop_assert_eq!(
            stats.live_keys,
            latest.values().filter(|(_, t)| *t > elapsed).count()
        );
    }
}
