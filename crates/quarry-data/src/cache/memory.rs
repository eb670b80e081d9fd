//! Bounded in-memory cache front.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A cached response body with its expiry time (unix seconds).
#[derive(Debug, Clone)]
struct Entry {
    body: Arc<[u8]>,
    expires_at: i64,
}

/// Bounded FIFO map of URL to response body.
///
/// The front tier of the response cache: hot bodies are served without
/// touching the database. Eviction is by insertion order (oldest first) once
/// the capacity is exceeded; a re-put of an existing URL replaces the body
/// but keeps its original position in the eviction queue.
#[derive(Debug)]
pub struct MemoryCache {
    inner: RwLock<Inner>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    order: VecDeque<String>,
}

impl MemoryCache {
    /// Creates a cache holding at most `capacity` bodies.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the body for `url` if present and not expired.
    pub async fn get(&self, url: &str, now: i64) -> Option<Arc<[u8]>> {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(url)
            .filter(|e| e.expires_at > now)
            .map(|e| Arc::clone(&e.body))
    }

    /// Inserts a body, evicting the oldest entry on overflow.
    pub async fn put(&self, url: &str, body: Arc<[u8]>, expires_at: i64) {
        let mut inner = self.inner.write().await;
        let previous = inner.entries.insert(
            url.to_string(),
            Entry { body, expires_at },
        );
        if previous.is_none() {
            inner.order.push_back(url.to_string());
            while inner.order.len() > self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.entries.remove(&oldest);
                }
            }
        }
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.order.clear();
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// True when no entries are held.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(s: &str) -> Arc<[u8]> {
        Arc::from(s.as_bytes().to_vec().into_boxed_slice())
    }

    #[tokio::test]
    async fn test_get_put_roundtrip() {
        let cache = MemoryCache::new(4);
        cache.put("a", body("one"), i64::MAX).await;
        let hit = cache.get("a", 0).await.unwrap();
        assert_eq!(&*hit, b"one");
        assert!(cache.get("b", 0).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_are_misses() {
        let cache = MemoryCache::new(4);
        cache.put("a", body("one"), 100).await;
        assert!(cache.get("a", 99).await.is_some());
        assert!(cache.get("a", 100).await.is_none());
    }

    #[tokio::test]
    async fn test_fifo_eviction() {
        let cache = MemoryCache::new(2);
        cache.put("a", body("1"), i64::MAX).await;
        cache.put("b", body("2"), i64::MAX).await;
        cache.put("c", body("3"), i64::MAX).await;
        // "a" was inserted first, so it is the one evicted
        assert!(cache.get("a", 0).await.is_none());
        assert!(cache.get("b", 0).await.is_some());
        assert!(cache.get("c", 0).await.is_some());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_replace_keeps_queue_position() {
        let cache = MemoryCache::new(2);
        cache.put("a", body("1"), i64::MAX).await;
        cache.put("b", body("2"), i64::MAX).await;
        cache.put("a", body("1b"), i64::MAX).await;
        cache.put("c", body("3"), i64::MAX).await;
        // "a" kept its original (oldest) slot despite the re-put
        assert!(cache.get("a", 0).await.is_none());
        assert_eq!(&*cache.get("b", 0).await.unwrap(), b"2");
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::new(4);
        cache.put("a", body("1"), i64::MAX).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
