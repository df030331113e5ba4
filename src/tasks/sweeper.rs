//! Bucket Sweeper Task
//!
//! Background task that periodically drops buckets whose expiry window has
//! fully elapsed.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::store::CacheState;
use crate::cache::Clock;

/// Spawns a background task that sweeps the cache every `interval`.
///
/// The first firing is due `interval` after this call; each firing schedules
/// the next one `interval` after it finishes. The lock is held only for the
/// duration of a sweep, never across an await.
///
/// # Returns
/// A JoinHandle for the spawned task; aborting it stops the recurrence.
pub(crate) fn spawn_sweep_task<K, V>(
    state: Arc<Mutex<CacheState<K, V>>>,
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + 'static,
{
    let mut deadline = Instant::now().checked_add(interval);

    tokio::spawn(async move {
        info!(?interval, "Starting bucket sweeper");

        loop {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                // Interval too large to schedule: never fires
                None => std::future::pending::<()>().await,
            }

            let report = state.lock().sweep(clock.now());

            if report.buckets_discarded > 0 {
                info!(
                    buckets = report.buckets_discarded,
                    entries = report.entries_reclaimed,
                    cursor = report.cursor,
                    "Sweep reclaimed expired buckets"
                );
            } else {
                debug!(cursor = report.cursor, "Sweep found no expired buckets");
            }

            deadline = Instant::now().checked_add(interval);
        }
    })
}
