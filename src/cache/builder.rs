//! Cache Builder Module
//!
//! Collects optional cache settings before construction.

use std::hash::Hash;
use std::time::Duration;

use crate::cache::{Cache, EvictionPolicy, FullnessCheck, RemovalListener};

// == Cache Builder ==
/// Builder for [`Cache`] with a removal listener or a custom fullness check.
///
/// ```
/// use std::time::Duration;
/// use policy_cache::{Cache, EvictionPolicy};
///
/// let cache: Cache<String, Vec<u8>> = Cache::builder(EvictionPolicy::Lfu)
///     .max_size(128)
///     .default_ttl(Duration::from_secs(60))
///     .on_remove(|key, _value| println!("dropped {key}"))
///     .build();
/// assert!(cache.is_empty());
/// ```
pub struct CacheBuilder<K, V> {
    policy: EvictionPolicy,
    max_size: usize,
    default_ttl: Duration,
    full_when: Option<FullnessCheck>,
    on_remove: Option<RemovalListener<K, V>>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Creates a builder for an unbounded cache without default TTL.
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            policy,
            max_size: 0,
            default_ttl: Duration::ZERO,
            full_when: None,
            on_remove: None,
        }
    }

    /// Sets the maximum number of entries, 0 for no limit.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the TTL applied by `put`, zero for no expiration.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Replaces the entry-count fullness check.
    ///
    /// The closure receives the current entry count. Prune decisions (and
    /// `is_full`) use it instead of comparing against `max_size`; LRU's
    /// structural eviction still uses `max_size`.
    pub fn full_when(mut self, check: impl Fn(usize) -> bool + Send + Sync + 'static) -> Self {
        self.full_when = Some(Box::new(check));
        self
    }

    /// Registers a listener for entries the cache discards on its own:
    /// pruned, evicted on insert, or found expired on read.
    ///
    /// The listener runs while the cache holds its exclusive lock, which is
    /// not reentrant. Calling back into the same cache from the listener
    /// (`len`, `get`, `put`, ...) deadlocks.
    pub fn on_remove(mut self, listener: impl Fn(&K, &V) + Send + Sync + 'static) -> Self {
        self.on_remove = Some(Box::new(listener));
        self
    }

    pub fn build(self) -> Cache<K, V> {
        Cache::from_parts(
            self.policy,
            self.max_size,
            self.default_ttl,
            self.full_when,
            self.on_remove,
        )
    }
}
