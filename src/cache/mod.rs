//! Cache Module
//!
//! Provides the in-memory cache core with TTL expiration and FIFO, LRU, LFU or
//! time-only eviction.

mod builder;
mod entry;
mod iter;
mod order;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use builder::CacheBuilder;
pub use iter::Values;
pub use policy::EvictionPolicy;
pub use stats::CacheStats;
pub use store::{Cache, FullnessCheck, RemovalListener};

pub(crate) use entry::CacheEntry;
pub(crate) use order::OrderTracker;

pub(crate) type RandomState = ahash::RandomState;
