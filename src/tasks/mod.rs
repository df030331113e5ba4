//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is alive.
//!
//! # Tasks
//! - Sweeper: drops buckets whose expiry window has fully elapsed

mod sweeper;

pub(crate) use sweeper::spawn_sweep_task;
