//! Line Protocol Module
//!
//! Parses and executes the commands accepted by the interactive binary.
//!
//! ```text
//! SET <key> <value> [timeout_secs]
//! GET <key>
//! DEL <key>
//! SWEEP
//! STATS
//! HELP
//! QUIT
//! ```

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat};

use crate::cache::{CacheStats, ExpiringCache, SweepReport};
use crate::config::parse_secs;
use crate::error::CommandError;

/// Usage text printed by `HELP`.
pub const HELP: &str = "\
SET <key> <value> [timeout_secs]  store a value (default timeout if omitted)
GET <key>                         read a value
DEL <key>                         remove a value
SWEEP                             reclaim elapsed buckets now
STATS                             print counters as JSON
QUIT                              exit";

// == Command ==
/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set {
        key: String,
        value: String,
        timeout: Option<Duration>,
    },
    Get {
        key: String,
    },
    Delete {
        key: String,
    },
    Sweep,
    Stats,
    Help,
    Quit,
}

impl Command {
    /// Parses one line. Verbs are case-insensitive.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(CommandError::Empty)?.to_ascii_uppercase();
        let args: Vec<&str> = parts.collect();

        match (verb.as_str(), args.as_slice()) {
            ("SET", [key, value]) => Ok(Command::Set {
                key: key.to_string(),
                value: value.to_string(),
                timeout: None,
            }),
            ("SET", [key, value, timeout]) => Ok(Command::Set {
                key: key.to_string(),
                value: value.to_string(),
                timeout: Some(
                    parse_secs(timeout)
                        .ok_or_else(|| CommandError::InvalidTimeout(timeout.to_string()))?,
                ),
            }),
            ("SET", _) => Err(CommandError::Arity {
                verb: "SET",
                expected: "SET <key> <value> [timeout_secs]",
            }),
            ("GET", [key]) => Ok(Command::Get {
                key: key.to_string(),
            }),
            ("GET", _) => Err(CommandError::Arity {
                verb: "GET",
                expected: "GET <key>",
            }),
            ("DEL" | "DELETE", [key]) => Ok(Command::Delete {
                key: key.to_string(),
            }),
            ("DEL" | "DELETE", _) => Err(CommandError::Arity {
                verb: "DEL",
                expected: "DEL <key>",
            }),
            ("SWEEP", []) => Ok(Command::Sweep),
            ("STATS", []) => Ok(Command::Stats),
            ("HELP", []) => Ok(Command::Help),
            ("QUIT" | "EXIT", []) => Ok(Command::Quit),
            ("SWEEP" | "STATS" | "HELP" | "QUIT" | "EXIT", _) => Err(CommandError::Arity {
                verb: "this command",
                expected: "no arguments",
            }),
            _ => Err(CommandError::Unknown(verb)),
        }
    }

    /// Runs the command against `cache`.
    pub fn execute(self, cache: &ExpiringCache<String, String>) -> Reply {
        match self {
            Command::Set {
                key,
                value,
                timeout,
            } => {
                let expire_at = cache.set(key, value, timeout);
                Reply::Stored { expire_at }
            }
            Command::Get { key } => match cache.get(&key) {
                Ok(value) => Reply::Value(value),
                Err(e) => Reply::Error(e.to_string()),
            },
            Command::Delete { key } => match cache.delete(&key) {
                Ok(()) => Reply::Deleted,
                Err(e) => Reply::Error(e.to_string()),
            },
            Command::Sweep => Reply::Swept(cache.sweep()),
            Command::Stats => Reply::Stats(cache.stats()),
            Command::Help => Reply::Help,
            Command::Quit => Reply::Bye,
        }
    }
}

// == Reply ==
/// Result of executing a command, printed one per line.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Stored { expire_at: Duration },
    Value(String),
    Deleted,
    Swept(SweepReport),
    Stats(CacheStats),
    Help,
    Bye,
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Stored { expire_at } => {
                write!(f, "OK (expires {})", format_instant(*expire_at))
            }
            Reply::Value(value) => write!(f, "{value}"),
            Reply::Deleted => write!(f, "OK"),
            Reply::Swept(report) => write!(
                f,
                "swept {} buckets, {} entries (cursor {})",
                report.buckets_discarded, report.entries_reclaimed, report.cursor
            ),
            Reply::Stats(stats) => {
                let json = serde_json::to_string(stats).map_err(|_| fmt::Error)?;
                write!(f, "{json}")
            }
            Reply::Help => write!(f, "{HELP}"),
            Reply::Bye => write!(f, "bye"),
            Reply::Error(msg) => write!(f, "ERR {msg}"),
        }
    }
}

/// Formats an epoch offset as RFC 3339, or "never" if out of range.
fn format_instant(instant: Duration) -> String {
    i64::try_from(instant.as_secs())
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, instant.subsec_nanos()))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "never".to_string())
}
