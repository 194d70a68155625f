//! File metadata cache
//!
//! Bounded TTL cache keyed by request path. Expiry is lazy: an entry
//! past its deadline is removed by the read that finds it, so no
//! background sweep is needed. The buffered-entry counter is maintained
//! inside the insert/evict paths and therefore decremented exactly once
//! per buffered entry.

use crate::handler::file_info::FileInfo;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct CacheEntry {
    info: Arc<FileInfo>,
    expires_at: Instant,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    buffered_count: usize,
}

/// Cache mapping request path to resolved file metadata.
pub struct FileCache {
    inner: Mutex<CacheInner>,
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FileCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                buffered_count: 0,
            }),
        }
    }

    /// Fetch a live entry. Expired entries are evicted here, releasing
    /// their buffered slot.
    pub fn get(&self, request_path: &str) -> Option<Arc<FileInfo>> {
        let mut inner = self.lock();

        let expired = match inner.entries.get(request_path) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(Arc::clone(&entry.info))
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            if let Some(entry) = inner.entries.remove(request_path) {
                if entry.info.is_buffered() {
                    inner.buffered_count -= 1;
                }
            }
        }

        None
    }

    /// Insert an entry with the given TTL unless the cache is already at
    /// `entry_limit` (replacing an existing key is always allowed).
    /// Returns whether the entry was stored.
    pub fn insert(
        &self,
        request_path: &str,
        info: Arc<FileInfo>,
        ttl: Duration,
        entry_limit: usize,
    ) -> bool {
        let mut inner = self.lock();

        if !inner.entries.contains_key(request_path) && inner.entries.len() >= entry_limit {
            return false;
        }

        if info.is_buffered() {
            inner.buffered_count += 1;
        }

        let previous = inner.entries.insert(
            request_path.to_string(),
            CacheEntry {
                info,
                expires_at: Instant::now() + ttl,
            },
        );

        if let Some(previous) = previous {
            if previous.info.is_buffered() {
                inner.buffered_count -= 1;
            }
        }

        true
    }

    /// Number of entries currently stored (including not-yet-collected
    /// expired ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored entries holding an in-memory content buffer.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.lock().buffered_count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // A poisoned mutex means another request panicked; the cache
        // content itself is still consistent, so keep serving.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileStat;
    use hyper::body::Bytes;

    const STAT: FileStat = FileStat {
        size: 4,
        mtime: 1_700_000_000,
        inode: 1,
    };

    fn unbuffered(path: &str) -> Arc<FileInfo> {
        Arc::new(FileInfo::unbuffered(path, STAT, true))
    }

    fn buffered(path: &str) -> Arc<FileInfo> {
        Arc::new(FileInfo::buffered(
            path,
            STAT,
            true,
            Bytes::from_static(b"test"),
        ))
    }

    #[test]
    fn test_get_returns_stored_entry() {
        let cache = FileCache::new();
        cache.insert("/a", unbuffered("/root/a"), Duration::from_secs(10), 8);

        let info = cache.get("/a").unwrap();
        assert_eq!(info.path, "/root/a");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_absent_and_evicted() {
        let cache = FileCache::new();
        cache.insert("/a", buffered("/root/a"), Duration::from_secs(0), 8);

        assert!(cache.get("/a").is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.buffered_len(), 0);
    }

    #[test]
    fn test_entry_limit_enforced() {
        let cache = FileCache::new();
        assert!(cache.insert("/a", unbuffered("/root/a"), Duration::from_secs(10), 2));
        assert!(cache.insert("/b", unbuffered("/root/b"), Duration::from_secs(10), 2));
        assert!(!cache.insert("/c", unbuffered("/root/c"), Duration::from_secs(10), 2));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("/c").is_none());
    }

    #[test]
    fn test_replace_allowed_at_limit() {
        let cache = FileCache::new();
        cache.insert("/a", unbuffered("/root/a"), Duration::from_secs(10), 1);
        assert!(cache.insert("/a", buffered("/root/a"), Duration::from_secs(10), 1));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.buffered_len(), 1);
        assert!(cache.get("/a").unwrap().is_buffered());
    }

    #[test]
    fn test_buffered_counter_tracks_replacement() {
        let cache = FileCache::new();
        cache.insert("/a", buffered("/root/a"), Duration::from_secs(10), 8);
        assert_eq!(cache.buffered_len(), 1);

        // Replacing a buffered entry with an unbuffered one frees the slot.
        cache.insert("/a", unbuffered("/root/a"), Duration::from_secs(10), 8);
        assert_eq!(cache.buffered_len(), 0);
    }

    #[test]
    fn test_zero_limit_disables_caching() {
        let cache = FileCache::new();
        assert!(!cache.insert("/a", unbuffered("/root/a"), Duration::from_secs(10), 0));
        assert!(cache.is_empty());
    }
}
