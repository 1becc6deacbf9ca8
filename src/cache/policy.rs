//! Eviction Policy Module
//!
//! Owns the backing map and implements the prune algorithm of each eviction policy.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cache::{CacheEntry, OrderTracker, RandomState};
use crate::error::CacheError;

// == Eviction Policy ==
/// Selects which entries a cache discards when it has to shrink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// First in, first out: the oldest inserted entry goes first.
    Fifo,
    /// Least recently used: the entry untouched for the longest time goes first.
    Lru,
    /// Least frequently used, with frequency decay on every eviction.
    Lfu,
    /// No size-driven eviction; only expired entries are pruned.
    Timed,
}

impl EvictionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Fifo => "fifo",
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Timed => "timed",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(EvictionPolicy::Fifo),
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            "timed" => Ok(EvictionPolicy::Timed),
            _ => Err(CacheError::InvalidPolicy(s.to_string())),
        }
    }
}

// == Removal Cause ==
/// Why the engine discarded an entry on its own initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RemovalCause {
    Expired,
    Evicted,
}

/// Receives the engine's capacity questions and removal notifications.
pub(crate) trait EvictionSink<K, V> {
    fn is_full(&self, len: usize) -> bool;

    fn removed(&self, entry: &CacheEntry<K, V>, cause: RemovalCause);
}

/// Per-policy ordering state.
#[derive(Debug)]
enum PolicyState<K> {
    /// Insertion order, only changed by inserts of new keys and removals.
    Fifo(OrderTracker<K>),
    /// Access order; behind its own lock so readers can promote keys.
    Lru(Mutex<OrderTracker<K>>),
    Lfu,
    Timed,
}

// == Policy Engine ==
/// Backing map plus the ordering state of the active policy.
///
/// All `&mut self` methods run under the cache's exclusive lock; `get`,
/// `promote` and `keys_in_order` run under shared access.
#[derive(Debug)]
pub(crate) struct PolicyEngine<K, V> {
    entries: HashMap<K, CacheEntry<K, V>, RandomState>,
    state: PolicyState<K>,
    max_size: usize,
    /// Whether prune has to look for expired entries at all
    expiry_active: bool,
}

impl<K, V> PolicyEngine<K, V>
where
    K: Clone + Eq + Hash,
{
    pub(crate) fn new(policy: EvictionPolicy, max_size: usize, default_ttl: Duration) -> Self {
        let state = match policy {
            EvictionPolicy::Fifo => PolicyState::Fifo(OrderTracker::new()),
            EvictionPolicy::Lru => PolicyState::Lru(Mutex::new(OrderTracker::new())),
            EvictionPolicy::Lfu => PolicyState::Lfu,
            EvictionPolicy::Timed => PolicyState::Timed,
        };

        Self {
            entries: HashMap::default(),
            state,
            max_size,
            expiry_active: !default_ttl.is_zero(),
        }
    }

    pub(crate) fn policy(&self) -> EvictionPolicy {
        match self.state {
            PolicyState::Fifo(_) => EvictionPolicy::Fifo,
            PolicyState::Lru(_) => EvictionPolicy::Lru,
            PolicyState::Lfu => EvictionPolicy::Lfu,
            PolicyState::Timed => EvictionPolicy::Timed,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Records that some entry carries a TTL other than the default.
    pub(crate) fn mark_custom_ttl(&mut self) {
        self.expiry_active = true;
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&CacheEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.get(key)
    }

    // == Promote ==
    /// Moves a key to the most-recently-used end. No-op for other policies.
    pub(crate) fn promote(&self, key: &K) {
        if let PolicyState::Lru(order) = &self.state {
            order.lock().promote(key);
        }
    }

    // == Insert ==
    /// Inserts an entry, replacing any entry stored under the same key.
    ///
    /// For LRU this also performs the structural eviction: once the map grows
    /// past `max_size`, the least recently used key is dropped.
    pub(crate) fn insert(
        &mut self,
        entry: CacheEntry<K, V>,
        sink: &impl EvictionSink<K, V>,
    ) -> Option<CacheEntry<K, V>> {
        let key = entry.key().clone();
        let previous = self.entries.insert(key.clone(), entry);

        match &mut self.state {
            PolicyState::Fifo(order) => order.append(&key),
            PolicyState::Lru(order) => {
                let order = order.get_mut();
                order.touch(&key);

                if self.max_size != 0 && self.entries.len() > self.max_size {
                    if let Some(eldest) = order.evict_oldest() {
                        if let Some(evicted) = self.entries.remove(&eldest) {
                            trace!(policy = "lru", "Evicted least recently used entry");
                            sink.removed(&evicted, RemovalCause::Evicted);
                        }
                    }
                }
            }
            PolicyState::Lfu | PolicyState::Timed => {}
        }

        previous
    }

    // == Remove ==
    /// Removes an entry; removing a missing key is a no-op.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<CacheEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let entry = self.entries.remove(key)?;
        match &mut self.state {
            PolicyState::Fifo(order) => order.remove(key),
            PolicyState::Lru(order) => order.get_mut().remove(key),
            PolicyState::Lfu | PolicyState::Timed => {}
        }
        Some(entry)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        match &mut self.state {
            PolicyState::Fifo(order) => order.clear(),
            PolicyState::Lru(order) => order.get_mut().clear(),
            PolicyState::Lfu | PolicyState::Timed => {}
        }
    }

    /// Snapshot of all keys in policy order (FIFO: insertion, LRU: least to
    /// most recently used, otherwise map order).
    pub(crate) fn keys_in_order(&self) -> Vec<K> {
        match &self.state {
            PolicyState::Fifo(order) => order.keys().cloned().collect(),
            PolicyState::Lru(order) => order.lock().keys().cloned().collect(),
            PolicyState::Lfu | PolicyState::Timed => self.entries.keys().cloned().collect(),
        }
    }

    // == Prune ==
    /// Runs the active policy's prune algorithm and returns the number of
    /// removed entries.
    pub(crate) fn prune(&mut self, now: Instant, sink: &impl EvictionSink<K, V>) -> usize {
        match self.state {
            PolicyState::Fifo(_) => self.prune_fifo(now, sink),
            PolicyState::Lru(_) => self.prune_lru(now, sink),
            PolicyState::Lfu => self.prune_lfu(now, sink),
            PolicyState::Timed => self.prune_expired(now, sink),
        }
    }

    /// Removes expired entries, then the oldest inserted one if still full.
    fn prune_fifo(&mut self, now: Instant, sink: &impl EvictionSink<K, V>) -> usize {
        let mut count = self.prune_expired(now, sink);

        if sink.is_full(self.entries.len()) {
            let first = match &self.state {
                PolicyState::Fifo(order) => order.peek_oldest().cloned(),
                _ => None,
            };
            if let Some(first) = first {
                if self.evict(&first, RemovalCause::Evicted, sink) {
                    count += 1;
                }
            }
        }

        count
    }

    /// Removes expired entries only; size eviction happens on insert.
    fn prune_lru(&mut self, now: Instant, sink: &impl EvictionSink<K, V>) -> usize {
        if !self.expiry_active {
            return 0;
        }
        self.prune_expired(now, sink)
    }

    /// Removes expired entries, then, if still full, normalizes every access
    /// count by the minimum and drops all entries that reach zero.
    fn prune_lfu(&mut self, now: Instant, sink: &impl EvictionSink<K, V>) -> usize {
        let mut count = self.prune_expired(now, sink);

        if !sink.is_full(self.entries.len()) {
            return count;
        }

        let Some(min) = self.entries.values().map(CacheEntry::access_count).min() else {
            return count;
        };

        self.entries.retain(|_, entry| {
            if entry.decay(min) > 0 {
                return true;
            }
            sink.removed(entry, RemovalCause::Evicted);
            count += 1;
            false
        });

        count
    }

    /// Removes every entry that is expired at `now`.
    fn prune_expired(&mut self, now: Instant, sink: &impl EvictionSink<K, V>) -> usize {
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        expired
            .iter()
            .filter(|key| self.evict(key, RemovalCause::Expired, sink))
            .count()
    }

    fn evict(&mut self, key: &K, cause: RemovalCause, sink: &impl EvictionSink<K, V>) -> bool {
        match self.remove(key) {
            Some(entry) => {
                sink.removed(&entry, cause);
                true
            }
            None => false,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Entry-count sink that records every removal.
    struct Recorder {
        max_size: usize,
        removed: RefCell<Vec<(&'static str, RemovalCause)>>,
    }

    impl Recorder {
        fn new(max_size: usize) -> Self {
            Self {
                max_size,
                removed: RefCell::new(Vec::new()),
            }
        }
    }

    impl EvictionSink<&'static str, u32> for Recorder {
        fn is_full(&self, len: usize) -> bool {
            self.max_size != 0 && len >= self.max_size
        }

        fn removed(&self, entry: &CacheEntry<&'static str, u32>, cause: RemovalCause) {
            self.removed.borrow_mut().push((*entry.key(), cause));
        }
    }

    fn engine(policy: EvictionPolicy, max_size: usize) -> PolicyEngine<&'static str, u32> {
        PolicyEngine::new(policy, max_size, Duration::ZERO)
    }

    fn put(
        engine: &mut PolicyEngine<&'static str, u32>,
        sink: &Recorder,
        key: &'static str,
        ttl: Duration,
        now: Instant,
    ) {
        engine.insert(CacheEntry::created_at(key, 0, ttl, now), sink);
    }

    fn touch(engine: &PolicyEngine<&'static str, u32>, key: &'static str, times: usize) {
        let entry = engine.get(key).unwrap();
        for _ in 0..times {
            entry.touch(Instant::now());
        }
        engine.promote(entry.key());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("FIFO".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Fifo);
        assert_eq!(" lru ".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Lru);
        assert_eq!("lfu".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Lfu);
        assert_eq!("Timed".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Timed);
        assert!(matches!(
            "arc".parse::<EvictionPolicy>(),
            Err(CacheError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_policy_display_roundtrips() {
        for policy in [
            EvictionPolicy::Fifo,
            EvictionPolicy::Lru,
            EvictionPolicy::Lfu,
            EvictionPolicy::Timed,
        ] {
            assert_eq!(policy.to_string().parse::<EvictionPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_fifo_prune_removes_expired_and_first() {
        let sink = Recorder::new(3);
        let mut engine = engine(EvictionPolicy::Fifo, 3);
        let now = Instant::now();

        put(&mut engine, &sink, "a", Duration::ZERO, now);
        put(&mut engine, &sink, "b", Duration::from_millis(10), now);
        put(&mut engine, &sink, "c", Duration::ZERO, now);

        // "b" expired, which frees room: "a" stays.
        let removed = engine.prune(now + Duration::from_millis(10), &sink);
        assert_eq!(removed, 1);
        assert_eq!(engine.keys_in_order(), vec!["a", "c"]);

        put(&mut engine, &sink, "d", Duration::ZERO, now);
        let removed = engine.prune(now, &sink);
        assert_eq!(removed, 1);
        assert_eq!(engine.keys_in_order(), vec!["c", "d"]);
        assert_eq!(
            *sink.removed.borrow(),
            vec![("b", RemovalCause::Expired), ("a", RemovalCause::Evicted)]
        );
    }

    #[test]
    fn test_fifo_reinsert_keeps_position() {
        let sink = Recorder::new(0);
        let mut engine = engine(EvictionPolicy::Fifo, 0);
        let now = Instant::now();

        put(&mut engine, &sink, "a", Duration::ZERO, now);
        put(&mut engine, &sink, "b", Duration::ZERO, now);
        put(&mut engine, &sink, "a", Duration::ZERO, now);

        assert_eq!(engine.keys_in_order(), vec!["a", "b"]);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_lru_reinsert_moves_to_newest() {
        let sink = Recorder::new(3);
        let mut engine = engine(EvictionPolicy::Lru, 3);
        let now = Instant::now();

        put(&mut engine, &sink, "a", Duration::ZERO, now);
        put(&mut engine, &sink, "b", Duration::ZERO, now);
        put(&mut engine, &sink, "c", Duration::ZERO, now);
        put(&mut engine, &sink, "a", Duration::ZERO, now);
        assert_eq!(engine.keys_in_order(), vec!["b", "c", "a"]);

        put(&mut engine, &sink, "d", Duration::ZERO, now);
        assert_eq!(engine.keys_in_order(), vec!["c", "a", "d"]);
        assert_eq!(*sink.removed.borrow(), vec![("b", RemovalCause::Evicted)]);
    }

    #[test]
    fn test_lru_structural_eviction_on_insert() {
        let sink = Recorder::new(2);
        let mut engine = engine(EvictionPolicy::Lru, 2);
        let now = Instant::now();

        put(&mut engine, &sink, "a", Duration::ZERO, now);
        put(&mut engine, &sink, "b", Duration::ZERO, now);
        touch(&engine, "a", 1);
        put(&mut engine, &sink, "c", Duration::ZERO, now);

        assert_eq!(engine.keys_in_order(), vec!["a", "c"]);
        assert_eq!(*sink.removed.borrow(), vec![("b", RemovalCause::Evicted)]);
    }

    #[test]
    fn test_lru_prune_skips_scan_without_ttls() {
        let sink = Recorder::new(0);
        let mut engine = engine(EvictionPolicy::Lru, 0);
        let now = Instant::now();

        put(&mut engine, &sink, "a", Duration::from_millis(1), now);
        assert_eq!(engine.prune(now + Duration::from_secs(1), &sink), 0);

        engine.mark_custom_ttl();
        assert_eq!(engine.prune(now + Duration::from_secs(1), &sink), 1);
        assert_eq!(engine.len(), 0);
    }

    #[test]
    fn test_lfu_prune_normalizes_frequencies() {
        let sink = Recorder::new(3);
        let mut engine = engine(EvictionPolicy::Lfu, 3);
        let now = Instant::now();

        put(&mut engine, &sink, "a", Duration::ZERO, now);
        put(&mut engine, &sink, "b", Duration::ZERO, now);
        put(&mut engine, &sink, "c", Duration::ZERO, now);
        touch(&engine, "a", 2);
        touch(&engine, "b", 3);
        touch(&engine, "c", 4);

        assert_eq!(engine.prune(now, &sink), 1);
        assert!(engine.get("a").is_none());
        assert_eq!(engine.get("b").unwrap().access_count(), 1);
        assert_eq!(engine.get("c").unwrap().access_count(), 2);
    }

    #[test]
    fn test_lfu_prune_removes_all_ties() {
        let sink = Recorder::new(3);
        let mut engine = engine(EvictionPolicy::Lfu, 3);
        let now = Instant::now();

        put(&mut engine, &sink, "a", Duration::ZERO, now);
        put(&mut engine, &sink, "b", Duration::ZERO, now);
        put(&mut engine, &sink, "c", Duration::ZERO, now);

        assert_eq!(engine.prune(now, &sink), 3);
        assert_eq!(engine.len(), 0);
        assert_eq!(sink.removed.borrow().len(), 3);
    }

    #[test]
    fn test_lfu_prune_under_bound_only_expires() {
        let sink = Recorder::new(3);
        let mut engine = engine(EvictionPolicy::Lfu, 3);
        let now = Instant::now();

        put(&mut engine, &sink, "a", Duration::from_millis(5), now);
        put(&mut engine, &sink, "b", Duration::ZERO, now);
        put(&mut engine, &sink, "c", Duration::ZERO, now);

        assert_eq!(engine.prune(now + Duration::from_millis(5), &sink), 1);
        assert_eq!(engine.len(), 2);
        assert_eq!(*sink.removed.borrow(), vec![("a", RemovalCause::Expired)]);
    }

    #[test]
    fn test_timed_prune_ignores_size() {
        let sink = Recorder::new(1);
        let mut engine = engine(EvictionPolicy::Timed, 1);
        let now = Instant::now();

        put(&mut engine, &sink, "a", Duration::ZERO, now);
        put(&mut engine, &sink, "b", Duration::from_millis(5), now);

        assert_eq!(engine.prune(now, &sink), 0);
        assert_eq!(engine.prune(now + Duration::from_millis(5), &sink), 1);
        assert_eq!(engine.keys_in_order(), vec!["a"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let sink = Recorder::new(0);
        let mut engine = engine(EvictionPolicy::Lru, 0);

        put(&mut engine, &sink, "a", Duration::ZERO, Instant::now());

        assert!(engine.remove("a").is_some());
        assert!(engine.remove("a").is_none());
        assert!(engine.keys_in_order().is_empty());
    }
}
