//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::DEFAULT_TIMEOUT;

/// Default sweep interval in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: f64 = 60.0;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Width of a bucket window and period of the background sweeper.
    /// `None` disables background sweeping.
    pub sweep_interval: Option<Duration>,
    /// Timeout applied to entries stored without an explicit one
    pub default_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SWEEP_INTERVAL` - Sweep interval in seconds, `0` disables (default: 60)
    /// - `DEFAULT_TIMEOUT` - Default entry timeout in seconds (default: 60)
    pub fn from_env() -> Self {
        let sweep_interval = env::var("SWEEP_INTERVAL")
            .ok()
            .and_then(|v| parse_secs(&v))
            .unwrap_or(Duration::from_secs_f64(DEFAULT_SWEEP_INTERVAL_SECS));
        let default_timeout = env::var("DEFAULT_TIMEOUT")
            .ok()
            .and_then(|v| parse_secs(&v))
            .unwrap_or(DEFAULT_TIMEOUT);

        Self {
            sweep_interval: normalize_interval(Some(sweep_interval)),
            default_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep_interval: Some(Duration::from_secs_f64(DEFAULT_SWEEP_INTERVAL_SECS)),
            default_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Parses a non-negative, possibly fractional, number of seconds.
pub fn parse_secs(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Maps a zero interval to `None`: both mean "never sweep".
pub fn normalize_interval(interval: Option<Duration>) -> Option<Duration> {
    interval.filter(|i| !i.is_zero())
}
