//! Cache Store Module
//!
//! Thread-safe cache core: one backing map behind a reader/writer lock, with the
//! active eviction policy plugged in for pruning and ordering.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::cache::policy::{EvictionSink, PolicyEngine, RemovalCause};
use crate::cache::stats::Counters;
use crate::cache::{CacheBuilder, CacheEntry, CacheStats, EvictionPolicy, Values};
use crate::config::CacheConfig;

/// Callback invoked with every entry the cache discards on its own.
pub type RemovalListener<K, V> = Box<dyn Fn(&K, &V) + Send + Sync>;

/// Replaces the entry-count fullness check; receives the current entry count.
pub type FullnessCheck = Box<dyn Fn(usize) -> bool + Send + Sync>;

// == Cache ==
/// In-process key/value cache with a pluggable eviction policy.
///
/// `get` and iteration take shared access, so concurrent readers never block
/// each other; `put`, `remove`, `clear` and `prune` take exclusive access.
/// Wrap the cache in an [`std::sync::Arc`] to share it between threads.
///
/// Values are cloned out on read. Wrap them in an `Arc` if that is expensive.
pub struct Cache<K, V> {
    engine: RwLock<PolicyEngine<K, V>>,
    /// Maximum number of entries, 0 = unbounded
    max_size: usize,
    /// TTL used by `put`, zero = never expires
    default_ttl: Duration,
    full_when: Option<FullnessCheck>,
    on_remove: Option<RemovalListener<K, V>>,
    counters: Counters,
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new cache.
    ///
    /// # Arguments
    /// * `policy` - Eviction policy used when the cache is full
    /// * `max_size` - Maximum number of entries, 0 for no limit
    /// * `default_ttl` - TTL for entries put without one, zero for no expiration
    pub fn new(policy: EvictionPolicy, max_size: usize, default_ttl: Duration) -> Self {
        Self::builder(policy)
            .max_size(max_size)
            .default_ttl(default_ttl)
            .build()
    }

    /// Creates a first-in-first-out cache without default TTL.
    pub fn fifo(max_size: usize) -> Self {
        Self::new(EvictionPolicy::Fifo, max_size, Duration::ZERO)
    }

    /// Creates a least-recently-used cache without default TTL.
    pub fn lru(max_size: usize) -> Self {
        Self::new(EvictionPolicy::Lru, max_size, Duration::ZERO)
    }

    /// Creates a least-frequently-used cache without default TTL.
    pub fn lfu(max_size: usize) -> Self {
        Self::new(EvictionPolicy::Lfu, max_size, Duration::ZERO)
    }

    /// Creates an unbounded cache whose entries only leave by expiring.
    ///
    /// Pair it with [`crate::tasks::spawn_prune_task`] so entries that are
    /// never read again still get dropped.
    pub fn timed(default_ttl: Duration) -> Self {
        Self::new(EvictionPolicy::Timed, 0, default_ttl)
    }

    /// Creates a cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.policy, config.max_size, config.default_ttl())
    }

    /// Starts building a cache with the given policy.
    pub fn builder(policy: EvictionPolicy) -> CacheBuilder<K, V> {
        CacheBuilder::new(policy)
    }

    pub(crate) fn from_parts(
        policy: EvictionPolicy,
        max_size: usize,
        default_ttl: Duration,
        full_when: Option<FullnessCheck>,
        on_remove: Option<RemovalListener<K, V>>,
    ) -> Self {
        Self {
            engine: RwLock::new(PolicyEngine::new(policy, max_size, default_ttl)),
            max_size,
            default_ttl,
            full_when,
            on_remove,
            counters: Counters::default(),
        }
    }

    // == Put ==
    /// Stores a value with the default TTL.
    ///
    /// Returns the value previously stored under `key`, if any.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.put_with_ttl(key, value, self.default_ttl)
    }

    /// Stores a value with its own TTL (`Duration::ZERO` = never expires).
    ///
    /// If the cache is full the active policy prunes first, so the new entry
    /// is never evicted by its own insertion.
    pub fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Option<V> {
        let mut engine = self.engine.write();
        let now = Instant::now();

        if ttl != self.default_ttl {
            engine.mark_custom_ttl();
        }

        if self.is_full_at(engine.len()) {
            self.prune_locked(&mut engine, now);
        }

        engine
            .insert(CacheEntry::created_at(key, value, ttl, now), self)
            .map(|previous| previous.value().clone())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A live entry is touched (last access refreshed, access count bumped,
    /// LRU recency updated). An expired entry is removed and reported absent.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let now = Instant::now();
        {
            let engine = self.engine.read();
            match engine.get(key) {
                None => {
                    self.counters.record_miss();
                    return None;
                }
                Some(entry) if !entry.is_expired(now) => {
                    let value = entry.touch(now).clone();
                    engine.promote(entry.key());
                    self.counters.record_hit();
                    return Some(value);
                }
                Some(_) => {}
            }
        }

        // Removing from the map needs `&mut`, which only the write guard hands
        // out, and the read guard can't be upgraded. Re-check under the write
        // guard: another reader may have removed the entry or a writer may
        // have replaced it.
        self.counters.record_miss();
        let mut engine = self.engine.write();
        if engine.get(key).is_some_and(|entry| entry.is_expired(now)) {
            if let Some(entry) = engine.remove(key) {
                trace!("Removed expired entry on read");
                self.removed(&entry, RemovalCause::Expired);
            }
        }
        None
    }

    /// Returns true if a live entry exists for `key`, without touching it.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.peek(key).is_some()
    }

    /// Reads a live value without touching it.
    pub(crate) fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let engine = self.engine.read();
        engine
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.value().clone())
    }

    // == Remove ==
    /// Removes an entry by key. Removing a missing key is a no-op.
    ///
    /// The removal listener is not invoked.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut engine = self.engine.write();
        engine.remove(key).map(|entry| entry.value().clone())
    }

    /// Removes every entry. The removal listener is not invoked.
    pub fn clear(&self) {
        self.engine.write().clear();
    }

    // == Prune ==
    /// Runs the active policy's prune algorithm.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&self) -> usize {
        let mut engine = self.engine.write();
        self.prune_locked(&mut engine, Instant::now())
    }

    fn prune_locked(&self, engine: &mut PolicyEngine<K, V>, now: Instant) -> usize {
        let removed = engine.prune(now, self);
        if removed > 0 {
            debug!(
                policy = %engine.policy(),
                removed,
                remaining = engine.len(),
                "Pruned cache"
            );
        }
        removed
    }

    // == Iterate ==
    /// Returns a lazy iterator over the values of all live entries.
    ///
    /// Expired entries are skipped, not removed, and reading through the
    /// iterator does not touch entries.
    pub fn values(&self) -> Values<'_, K, V> {
        let keys = self.engine.read().keys_in_order();
        Values::new(self, keys)
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included until they
    /// are noticed.
    pub fn len(&self) -> usize {
        self.engine.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Is Full ==
    /// Returns true if the cache has reached its bound.
    ///
    /// Always false for an unbounded cache unless a custom fullness check was
    /// configured.
    pub fn is_full(&self) -> bool {
        self.is_full_at(self.len())
    }

    fn is_full_at(&self, len: usize) -> bool {
        match &self.full_when {
            Some(check) => check(len),
            None => self.max_size != 0 && len >= self.max_size,
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.engine.read().policy()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl<K, V> EvictionSink<K, V> for Cache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn is_full(&self, len: usize) -> bool {
        self.is_full_at(len)
    }

    fn removed(&self, entry: &CacheEntry<K, V>, cause: RemovalCause) {
        match cause {
            RemovalCause::Expired => self.counters.record_expiration(),
            RemovalCause::Evicted => self.counters.record_eviction(),
        }
        if let Some(listener) = &self.on_remove {
            listener(entry.key(), entry.value());
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .field("custom_full_check", &self.full_when.is_some())
            .field("on_remove", &self.on_remove.is_some())
            .finish_non_exhaustive()
    }
}
