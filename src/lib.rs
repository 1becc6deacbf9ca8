//! Policy Cache - an in-process key/value cache
//!
//! Trades memory for latency with FIFO, LRU, LFU or time-only eviction over a
//! shared, TTL-aware core.
//!
//! ```
//! use policy_cache::Cache;
//!
//! let cache = Cache::lru(2);
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get("a");
//! cache.put("c", 3);
//!
//! assert_eq!(cache.get("b"), None);
//! assert_eq!(cache.get("a"), Some(1));
//! ```

#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod error;
pub mod file_cache;
pub mod tasks;

pub use cache::{Cache, CacheBuilder, CacheStats, EvictionPolicy, Values};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use file_cache::FileLfuCache;
pub use tasks::spawn_prune_task;
