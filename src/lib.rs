//! Expiring Cache - an in-process key-value cache with automatic expiry
//!
//! Every entry carries a deadline. Reads enforce it exactly, while a
//! background sweeper drops whole time buckets once their window has passed.

pub mod cache;
pub mod command;
pub mod config;
pub mod error;
pub(crate) mod tasks;

pub use cache::{ExpiringCache, DEFAULT_TIMEOUT};
pub use config::Config;
pub use error::CacheError;
