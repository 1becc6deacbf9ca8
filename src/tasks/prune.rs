//! Scheduled Prune Task
//!
//! Background task that periodically prunes a cache.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::Cache;

/// Spawns a background task that periodically prunes the cache.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between prune passes. Each pass goes through [`Cache::prune`], so it takes
/// the same exclusive lock as any other write.
///
/// This is what keeps a time-only cache bounded: entries that are never read
/// again are otherwise only dropped when some later `put` happens to prune.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `interval` - Time between prune passes
///
/// # Returns
/// A JoinHandle for the spawned task; abort it to stop pruning.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Cache::timed(Duration::from_secs(30)));
/// let prune_handle = spawn_prune_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// prune_handle.abort();
/// ```
pub fn spawn_prune_task<K, V>(cache: Arc<Cache<K, V>>, interval: Duration) -> JoinHandle<()>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            policy = %cache.policy(),
            "Starting prune task with interval of {:?}", interval
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.prune();

            if removed > 0 {
                info!("Scheduled prune: removed {} entries", removed);
            } else {
                debug!("Scheduled prune: nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prune_task_removes_expired_entries() {
        let cache = Arc::new(Cache::timed(Duration::from_millis(50)));
        cache.put("expire_soon", "value");

        let handle = spawn_prune_task(cache.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(300)).await;

        // Nobody read the entry, so only the task can have removed it.
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_prune_task_preserves_valid_entries() {
        let cache = Arc::new(Cache::timed(Duration::from_secs(3600)));
        cache.put("long_lived", "value");

        let handle = spawn_prune_task(cache.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get("long_lived"), Some("value"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_prune_task_can_be_aborted() {
        let cache: Arc<Cache<String, String>> = Arc::new(Cache::lru(10));

        let handle = spawn_prune_task(cache, Duration::from_millis(10));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
