//! Two-tier HTTP response cache.
//!
//! Raw response bodies are cached keyed by the full request URL: a bounded
//! in-memory FIFO front over a SQLite backing store. The cache is explicitly
//! non-authoritative: the SEC API is the truth. Read failures degrade to a
//! network fetch and write failures are logged and swallowed, so callers
//! never fail because of the cache.

mod memory;
mod store;

pub use memory::MemoryCache;
pub use store::{SqliteStore, StoreStats};

use crate::error::Result;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Filename of the cache database inside the cache directory.
pub const CACHE_DB_FILE: &str = "responses.db";

/// Hex SHA-256 of a URL string; the primary key of the backing store.
pub fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Counts reported by [`ResponseCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Persistent entries.
    pub entries: usize,
    /// Total persistent body bytes.
    pub size_bytes: u64,
}

/// The two-tier response cache.
#[derive(Debug)]
pub struct ResponseCache {
    memory: MemoryCache,
    store: SqliteStore,
}

impl ResponseCache {
    /// Opens the cache inside `cache_dir`, creating the directory and the
    /// database as needed. A corrupt database is deleted and rebuilt.
    pub fn open(cache_dir: &Path, memory_capacity: usize) -> Result<Self> {
        let store = SqliteStore::open(cache_dir.join(CACHE_DB_FILE))?;
        Ok(Self {
            memory: MemoryCache::new(memory_capacity),
            store,
        })
    }

    /// Fully in-memory cache (test isolation).
    pub fn in_memory(memory_capacity: usize) -> Result<Self> {
        Ok(Self {
            memory: MemoryCache::new(memory_capacity),
            store: SqliteStore::in_memory()?,
        })
    }

    /// Looks up `url`, promoting backing-store hits into the memory front.
    ///
    /// Never fails: storage errors are logged and reported as a miss.
    pub async fn get(&self, url: &str) -> Option<Arc<[u8]>> {
        let now = Utc::now().timestamp();

        if let Some(body) = self.memory.get(url, now).await {
            debug!(url, tier = "memory", "cache hit");
            return Some(body);
        }

        match self.store.get(&url_hash(url), now) {
            Ok(Some((body, expires_at))) => {
                debug!(url, tier = "disk", "cache hit");
                let body: Arc<[u8]> = Arc::from(body.into_boxed_slice());
                self.memory.put(url, Arc::clone(&body), expires_at).await;
                Some(body)
            }
            Ok(None) => {
                debug!(url, "cache miss");
                None
            }
            Err(err) => {
                warn!(url, error = %err, "cache read failed, degrading to fetch");
                None
            }
        }
    }

    /// Writes `body` to both tiers with the given TTL.
    ///
    /// Never fails: a write error costs a future refetch, nothing more.
    pub async fn put(&self, url: &str, body: &[u8], ttl_hours: u64) {
        let now = Utc::now().timestamp();
        let expires_at = now + (ttl_hours as i64) * 3_600;

        let shared: Arc<[u8]> = Arc::from(body.to_vec().into_boxed_slice());
        self.memory.put(url, shared, expires_at).await;

        if let Err(err) = self.store.put(&url_hash(url), url, body, now, expires_at) {
            warn!(url, error = %err, "cache write failed");
        }
    }

    /// Empties both tiers.
    pub async fn clear(&self) -> Result<()> {
        self.memory.clear().await;
        self.store.clear()
    }

    /// Deletes expired persistent rows; returns the count removed.
    pub fn purge_expired(&self) -> Result<usize> {
        self.store.purge_expired(Utc::now().timestamp())
    }

    /// Persistent entry count and size.
    pub fn stats(&self) -> Result<CacheStats> {
        let stats = self.store.stats()?;
        Ok(CacheStats {
            entries: stats.entries,
            size_bytes: stats.size_bytes,
        })
    }
}
