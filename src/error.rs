//! Error types for the expiring cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Error returned by cache lookups and deletions.
///
/// Carries the offending key so callers can report it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError<K> {
    /// Key is absent, or present but past its deadline
    #[error("Key not found: {0:?}")]
    NotFound(K),
}

impl<K> CacheError<K> {
    /// Returns the key the error refers to.
    pub fn key(&self) -> &K {
        match self {
            CacheError::NotFound(key) => key,
        }
    }
}

// == Command Error Enum ==
/// Errors produced while parsing a line of the interactive protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Blank input line
    #[error("Empty command")]
    Empty,

    /// Verb not recognised
    #[error("Unknown command: {0}")]
    Unknown(String),

    /// Wrong number of arguments for a verb
    #[error("Wrong number of arguments for {verb}: expected {expected}")]
    Arity {
        verb: &'static str,
        expected: &'static str,
    },

    /// Timeout argument is not a non-negative number of seconds
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T, K = String> = std::result::Result<T, CacheError<K>>;
