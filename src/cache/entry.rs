//! Cache Entry Module
//!
//! Defines a single cached value together with its access bookkeeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Key, value and TTL are fixed at creation. The last-access time and access
/// count are atomics so a reader holding only shared access to the store can
/// still refresh them.
#[derive(Debug)]
pub(crate) struct CacheEntry<K, V> {
    key: K,
    value: V,
    /// Time-to-live measured from the last access, zero = never expires
    ttl: Duration,
    /// Creation instant, the base for `last_access_nanos`
    created_at: Instant,
    /// Last access as nanoseconds after `created_at`
    last_access_nanos: AtomicU64,
    /// Number of successful reads (decayed by LFU pruning)
    access_count: AtomicU64,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new cache entry whose last access is `now`.
    ///
    /// # Arguments
    /// * `key` - The key the entry is stored under
    /// * `value` - The value to store
    /// * `ttl` - Time-to-live, `Duration::ZERO` for no expiration
    pub fn created_at(key: K, value: V, ttl: Duration, now: Instant) -> Self {
        Self {
            key,
            value,
            ttl,
            created_at: now,
            last_access_nanos: AtomicU64::new(0),
            access_count: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the instant of the last successful read (or creation).
    pub fn last_access(&self) -> Instant {
        self.created_at + Duration::from_nanos(self.last_access_nanos.load(Ordering::Acquire))
    }

    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Acquire)
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= last_access + ttl`.
    /// A zero TTL never expires. This never mutates the entry.
    pub fn is_expired(&self, now: Instant) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        match self.last_access().checked_add(self.ttl) {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    // == Touch ==
    /// Records a successful read at `now` and returns the value.
    ///
    /// The last-access time only moves forward, even when racing readers
    /// publish their timestamps out of order.
    pub fn touch(&self, now: Instant) -> &V {
        let offset = now.saturating_duration_since(self.created_at).as_nanos();
        let offset = u64::try_from(offset).unwrap_or(u64::MAX);
        self.last_access_nanos.fetch_max(offset, Ordering::AcqRel);
        self.access_count.fetch_add(1, Ordering::AcqRel);
        &self.value
    }

    /// Subtracts `amount` from the access count and returns the new count.
    pub fn decay(&mut self, amount: u64) -> u64 {
        let count = self.access_count.get_mut();
        *count = count.saturating_sub(amount);
        *count
    }
}
