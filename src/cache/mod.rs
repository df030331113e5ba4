//! Cache Module
//!
//! Provides an in-memory key-value cache with per-entry deadlines and
//! bucketed background reclamation.

pub mod bucket;
mod clock;
mod entry;
mod stats;
pub(crate) mod store;

#[cfg(test)]
mod property_tests;

use std::time::Duration;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::Entry;
pub use stats::CacheStats;
pub use store::{ExpiringCache, SweepReport};

// == Public Constants ==
/// Timeout applied by `set` when none is given
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
