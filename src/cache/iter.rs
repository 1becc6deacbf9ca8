//! Values Iterator Module
//!
//! Lazy iteration over live cache values.

use std::hash::Hash;
use std::iter::FusedIterator;

use crate::cache::Cache;

// == Values ==
/// Iterator over the values of live entries, created by [`Cache::values`].
///
/// Walks a snapshot of the keys taken at creation. Each step reads the cache
/// under shared access, so entries removed or expired in the meantime are
/// skipped; entries inserted afterwards are not visited.
pub struct Values<'a, K, V> {
    cache: &'a Cache<K, V>,
    keys: std::vec::IntoIter<K>,
    current: Option<K>,
}

impl<'a, K, V> Values<'a, K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub(crate) fn new(cache: &'a Cache<K, V>, keys: Vec<K>) -> Self {
        Self {
            cache,
            keys: keys.into_iter(),
            current: None,
        }
    }

    // == Remove Current ==
    /// Removes the entry of the most recently yielded value from the cache.
    ///
    /// Returns false if nothing has been yielded yet, the current entry was
    /// already removed through this method, or it has since left the cache.
    pub fn remove_current(&mut self) -> bool {
        match self.current.take() {
            Some(key) => self.cache.remove(&key).is_some(),
            None => false,
        }
    }
}

impl<K, V> Iterator for Values<'_, K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    type Item = V;

    fn next(&mut self) -> Option<V> {
        for key in self.keys.by_ref() {
            if let Some(value) = self.cache.peek(&key) {
                self.current = Some(key);
                return Some(value);
            }
        }
        self.current = None;
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.keys.size_hint().1)
    }
}

impl<K, V> FusedIterator for Values<'_, K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use crate::cache::Cache;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_values_follow_fifo_order() {
        let cache = Cache::fifo(10);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.get("a");

        assert_eq!(cache.values().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_values_follow_lru_order() {
        let cache = Cache::lru(10);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.get("a");

        assert_eq!(cache.values().collect::<Vec<_>>(), vec![2, 3, 1]);
    }

    #[test]
    fn test_values_skip_expired_without_removing() {
        let cache = Cache::fifo(10);
        cache.put_with_ttl("a", 1, Duration::from_millis(20));
        cache.put("b", 2);
        cache.put("c", 3);

        sleep(Duration::from_millis(50));

        assert_eq!(cache.values().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_values_remove_current() {
        let cache = Cache::fifo(10);
        cache.put("a", 1);
        cache.put("b", 2);

        let mut values = cache.values();
        assert!(!values.remove_current());
        assert_eq!(values.next(), Some(1));
        assert!(values.remove_current());
        assert!(!values.remove_current());
        assert_eq!(values.next(), Some(2));
        assert_eq!(values.next(), None);
        assert_eq!(values.next(), None);

        assert_eq!(cache.len(), 1);
        assert!(!cache.contains_key("a"));
    }

    #[test]
    fn test_values_do_not_touch_entries() {
        let cache = Cache::lfu(10);
        cache.put("a", 1);

        let _ = cache.values().count();

        assert_eq!(cache.stats().hits, 0);
    }
}
