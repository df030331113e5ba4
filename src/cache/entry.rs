//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with an absolute deadline.

use std::time::Duration;

// == Cache Entry ==
/// A stored value and the instant after which it is logically gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Absolute expiry instant, measured from the Unix epoch
    pub expire_at: Duration,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates an entry expiring `timeout` after `now`.
    ///
    /// The deadline saturates at `Duration::MAX`.
    pub fn new(value: V, now: Duration, timeout: Duration) -> Self {
        Self {
            value,
            expire_at: now.saturating_add(timeout),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is expired at `now`.
    ///
    /// Boundary condition: an entry whose deadline equals `now` is expired.
    pub fn is_expired_at(&self, now: Duration) -> bool {
        now >= self.expire_at
    }

    // == Remaining ==
    /// Returns the time left before expiry, zero once expired.
    pub fn remaining_at(&self, now: Duration) -> Duration {
        self.expire_at.saturating_sub(now)
    }
}
