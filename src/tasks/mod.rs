//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Scheduled prune: calls `Cache::prune` at a fixed interval

mod prune;

pub use prune::spawn_prune_task;
