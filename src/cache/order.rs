//! Order Tracker Module
//!
//! Keeps keys in a stable oldest-to-newest sequence for FIFO and LRU eviction.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::cache::RandomState;

// == Order Tracker ==
/// Tracks key order for FIFO and LRU eviction strategies.
///
/// Every tracked key holds a monotonically increasing tick:
/// - Smallest tick = oldest (next eviction candidate)
/// - Largest tick = newest
///
/// FIFO only assigns a tick on first insertion, LRU re-ticks on every touch.
#[derive(Debug)]
pub struct OrderTracker<K> {
    /// Current tick of every tracked key
    ticks: HashMap<K, u64, RandomState>,
    /// Keys ordered by tick
    order: BTreeMap<u64, K>,
    next_tick: u64,
}

impl<K> Default for OrderTracker<K> {
    fn default() -> Self {
        Self {
            ticks: HashMap::default(),
            order: BTreeMap::new(),
            next_tick: 0,
        }
    }
}

impl<K> OrderTracker<K>
where
    K: Clone + Eq + Hash,
{
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as newest.
    ///
    /// If key exists, it is moved to the newest end.
    /// If key is new, it is appended there.
    pub fn touch(&mut self, key: &K) {
        let tick = self.bump();
        if let Some(previous) = self.ticks.insert(key.clone(), tick) {
            self.order.remove(&previous);
        }
        self.order.insert(tick, key.clone());
    }

    // == Append ==
    /// Appends a key at the newest end unless it is already tracked.
    ///
    /// A key that is already tracked keeps its position.
    pub fn append(&mut self, key: &K) {
        if self.ticks.contains_key(key) {
            return;
        }
        self.touch(key);
    }

    // == Promote ==
    /// Moves an already tracked key to the newest end; unknown keys are ignored.
    pub fn promote<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let tick = self.next_tick;
        let Some(current) = self.ticks.get_mut(key) else {
            return;
        };
        let previous = std::mem::replace(current, tick);
        self.next_tick += 1;
        if let Some(owned) = self.order.remove(&previous) {
            self.order.insert(tick, owned);
        }
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the oldest key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the oldest key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.order.values().next()
    }

    /// Iterates keys from oldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.values()
    }

    pub fn clear(&mut self) {
        self.ticks.clear();
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[cfg(test)]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.ticks.contains_key(key)
    }

    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }
}
