//! File Cache Module
//!
//! Keeps the contents of frequently read files in memory, bounded by a total
//! byte budget and evicted least-frequently-used first.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::cache::{Cache, EvictionPolicy};
use crate::error::{CacheError, Result};

// == File LFU Cache ==
/// Byte-budget cache of file contents on top of an LFU [`Cache`].
///
/// Fullness is measured in cached bytes instead of entries: once the used
/// bytes exceed `max_size`, the next insert prunes least frequently used files
/// first. Files larger than `max_file_size` are read but never cached.
#[derive(Debug)]
pub struct FileLfuCache {
    cache: Cache<PathBuf, Arc<[u8]>>,
    /// Total byte budget
    max_size: usize,
    /// Largest file that gets cached, 0 = no per-file limit
    max_file_size: usize,
    used_size: Arc<AtomicUsize>,
}

impl FileLfuCache {
    // == Constructor ==
    /// Creates a file cache with a byte budget of `max_size`.
    ///
    /// Files up to half the budget are cached; entries never expire.
    pub fn new(max_size: usize) -> Self {
        Self::with_limits(max_size, max_size / 2, Duration::ZERO)
    }

    /// Creates a file cache with explicit limits.
    ///
    /// # Arguments
    /// * `max_size` - Total cache size in bytes
    /// * `max_file_size` - Largest cacheable file in bytes, 0 for no limit
    /// * `timeout` - TTL of cached files, zero for no expiration
    pub fn with_limits(max_size: usize, max_file_size: usize, timeout: Duration) -> Self {
        let used_size = Arc::new(AtomicUsize::new(0));

        let used = Arc::clone(&used_size);
        let released = Arc::clone(&used_size);
        let cache = Cache::builder(EvictionPolicy::Lfu)
            .default_ttl(timeout)
            .full_when(move |_| used.load(Ordering::Acquire) > max_size)
            .on_remove(move |path: &PathBuf, bytes: &Arc<[u8]>| {
                trace!(path = %path.display(), bytes = bytes.len(), "Released cached file");
                release(&released, bytes.len());
            })
            .build();

        Self {
            cache,
            max_size,
            max_file_size,
            used_size,
        }
    }

    // == Get File Bytes ==
    /// Returns the contents of `path`, reading the file on a cache miss.
    ///
    /// The read happens before the cache is locked for the insert, so other
    /// callers are never blocked on file I/O.
    pub fn get_file_bytes(&self, path: impl AsRef<Path>) -> Result<Arc<[u8]>> {
        let path = path.as_ref();
        if let Some(bytes) = self.cache.get(path) {
            return Ok(bytes);
        }

        let bytes: Arc<[u8]> = fs::read(path)
            .map_err(|source| CacheError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .into();

        if self.max_file_size != 0 && bytes.len() > self.max_file_size {
            trace!(path = %path.display(), bytes = bytes.len(), "File too large to cache");
            return Ok(bytes);
        }

        // Account before inserting so the insert sees the new total.
        self.used_size.fetch_add(bytes.len(), Ordering::AcqRel);
        if let Some(replaced) = self.cache.put(path.to_path_buf(), Arc::clone(&bytes)) {
            release(&self.used_size, replaced.len());
        }

        Ok(bytes)
    }

    /// Returns the total byte budget.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the largest file size that gets cached, 0 if unlimited.
    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Returns the number of bytes currently held by cached files.
    pub fn used_size(&self) -> usize {
        self.used_size.load(Ordering::Acquire)
    }

    /// Returns the number of cached files.
    pub fn cached_files_count(&self) -> usize {
        self.cache.len()
    }

    pub fn timeout(&self) -> Duration {
        self.cache.default_ttl()
    }

    /// Prunes expired files and, if over budget, the least frequently used ones.
    pub fn prune(&self) -> usize {
        self.cache.prune()
    }

    /// Drops every cached file.
    pub fn clear(&self) {
        self.cache.clear();
        self.used_size.store(0, Ordering::Release);
    }
}

fn release(used_size: &AtomicUsize, bytes: usize) {
    let _ = used_size.fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
        Some(used.saturating_sub(bytes))
    });
}
