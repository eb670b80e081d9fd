//! SQLite backing store for the response cache.

use crate::error::{DataError, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Persistent response-body store.
///
/// One row per URL, keyed by the SHA-256 of the URL string. Bodies are kept
/// verbatim; parsing happens in the client layer. The store is
/// non-authoritative: a lost or corrupt database only costs refetches.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Counts reported by [`SqliteStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of cached bodies.
    pub entries: usize,
    /// Total size of cached bodies in bytes.
    pub size_bytes: u64,
}

impl SqliteStore {
    /// Opens (or creates) the store at `path`.
    ///
    /// A database that cannot be opened or initialized is treated as corrupt:
    /// its files are deleted and a fresh one is created in place.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match Self::open_and_init(path) {
            Ok(store) => Ok(store),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "response cache unreadable, rebuilding");
                Self::remove_database_files(path);
                Self::open_and_init(path)
            }
        }
    }

    /// Opens an in-memory store (test isolation).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_and_init(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn remove_database_files(path: &Path) {
        let base = path.display().to_string();
        for file in [base.clone(), format!("{base}-wal"), format!("{base}-shm")] {
            let _ = std::fs::remove_file(PathBuf::from(file));
        }
    }

    fn initialize_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS responses (
                url_hash TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                body BLOB NOT NULL,
                fetched_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_responses_expires ON responses(expires_at)",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DataError::Cache("cache store mutex poisoned".to_string()))
    }

    /// Returns the body for `url_hash` if present and unexpired at `now`.
    pub fn get(&self, url_hash: &str, now: i64) -> Result<Option<(Vec<u8>, i64)>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT body, expires_at FROM responses
                 WHERE url_hash = ?1 AND expires_at > ?2",
                params![url_hash, now],
                |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    /// Upserts a body.
    pub fn put(
        &self,
        url_hash: &str,
        url: &str,
        body: &[u8],
        fetched_at: i64,
        expires_at: i64,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO responses (url_hash, url, body, fetched_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![url_hash, url, body, fetched_at, expires_at],
        )?;
        Ok(())
    }

    /// Deletes every row.
    pub fn clear(&self) -> Result<()> {
        self.lock()?.execute("DELETE FROM responses", [])?;
        Ok(())
    }

    /// Deletes rows whose `expires_at` has passed; returns the count removed.
    pub fn purge_expired(&self, now: i64) -> Result<usize> {
        let removed = self
            .lock()?
            .execute("DELETE FROM responses WHERE expires_at <= ?1", params![now])?;
        Ok(removed)
    }

    /// Entry count and total body size.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;
        let (entries, size_bytes): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(body)), 0) FROM responses",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(StoreStats {
            entries: entries as usize,
            size_bytes: size_bytes as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_expiry() {
        let store = SqliteStore::in_memory().unwrap();
        store.put("h1", "http://x/a", b"body-a", 100, 200).unwrap();

        let (body, expires_at) = store.get("h1", 150).unwrap().unwrap();
        assert_eq!(body, b"body-a");
        assert_eq!(expires_at, 200);

        // Expired entries are misses
        assert!(store.get("h1", 200).unwrap().is_none());
        // Unknown hashes are misses
        assert!(store.get("h2", 150).unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_body() {
        let store = SqliteStore::in_memory().unwrap();
        store.put("h1", "http://x/a", b"v1", 100, 200).unwrap();
        store.put("h1", "http://x/a", b"v2", 150, 300).unwrap();

        let (body, _) = store.get("h1", 160).unwrap().unwrap();
        assert_eq!(body, b"v2");
        assert_eq!(store.stats().unwrap().entries, 1);
    }

    #[test]
    fn test_purge_expired() {
        let store = SqliteStore::in_memory().unwrap();
        store.put("h1", "u1", b"a", 0, 100).unwrap();
        store.put("h2", "u2", b"b", 0, 300).unwrap();

        assert_eq!(store.purge_expired(200).unwrap(), 1);
        assert_eq!(store.stats().unwrap().entries, 1);
        assert!(store.get("h2", 200).unwrap().is_some());
    }

    #[test]
    fn test_stats() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(
            store.stats().unwrap(),
            StoreStats {
                entries: 0,
                size_bytes: 0
            }
        );
        store.put("h1", "u1", b"abcd", 0, 100).unwrap();
        store.put("h2", "u2", b"ef", 0, 100).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.size_bytes, 6);
    }

    #[test]
    fn test_clear() {
        let store = SqliteStore::in_memory().unwrap();
        store.put("h1", "u1", b"a", 0, 100).unwrap();
        store.clear().unwrap();
        assert_eq!(store.stats().unwrap().entries, 0);
    }

    #[test]
    fn test_corrupt_database_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.db");
        std::fs::write(&path, b"this is not a sqlite database").unwrap();

        let store = SqliteStore::open(&path).unwrap();
        store.put("h1", "u1", b"a", 0, 100).unwrap();
        assert_eq!(store.stats().unwrap().entries, 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.put("h1", "u1", b"persisted", 0, i64::MAX).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let (body, _) = store.get("h1", 10).unwrap().unwrap();
        assert_eq!(body, b"persisted");
    }
}
