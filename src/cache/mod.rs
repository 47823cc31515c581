//! SQLite-based cache of parsed queries.
//!
//! Parsing may involve a network round-trip to the delegate, so repeated
//! queries are answered from a small local store instead. The cache is an
//! explicit value handed to [`crate::pipeline::QueryPipeline`]; nothing here
//! is global.
//!
//! # Design
//!
//! - Key: SHA-256 of the trimmed query text, optionally scoped by the
//!   parsing configuration that produced the value
//! - Value: the [`ParsedQuery`] as JSON
//! - TTL per entry, oldest entries evicted past `max_entries`
//! - Versioned - auto-clears on version mismatch
//!
//! The default location is `<cache dir>/plasmaq/cache.db`.

mod hash;
pub use hash::{query_key, scoped_key};

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::model::ParsedQuery;

/// Current cache schema version. Bump this when the cache format changes.
const CACHE_VERSION: i32 = 2;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to determine cache directory")]
    NoCacheDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache connection lock poisoned")]
    Poisoned,
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Expiry and size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Lifetime of an entry. Zero stores entries that are already expired.
    pub ttl: Duration,
    /// Entries kept after an insert; the oldest go first.
    pub max_entries: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 100,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in the cache.
    pub entry_count: usize,
    /// Entries past their expiry that have not been purged yet.
    pub expired_count: usize,
    /// Total size of all values in bytes.
    pub total_size_bytes: usize,
}

/// SQLite-based parsed-query cache.
pub struct QueryCache {
    conn: Mutex<Connection>,
    policy: CachePolicy,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl QueryCache {
    /// Open or create the cache database at `path`.
    ///
    /// If the cache version doesn't match, it's automatically cleared.
    pub fn open(path: impl AsRef<Path>, policy: CachePolicy) -> CacheResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn, policy)
    }

    /// Open the cache at [`QueryCache::default_path`].
    pub fn open_default(policy: CachePolicy) -> CacheResult<Self> {
        Self::open(Self::default_path()?, policy)
    }

    /// Open an in-memory cache (for testing).
    pub fn open_in_memory(policy: CachePolicy) -> CacheResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, policy)
    }

    /// Get the default path of the cache database.
    pub fn default_path() -> CacheResult<PathBuf> {
        let base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(base.join("plasmaq").join("cache.db"))
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn from_connection(conn: Connection, policy: CachePolicy) -> CacheResult<Self> {
        let cache = Self {
            conn: Mutex::new(conn),
            policy,
        };
        cache.init()?;
        Ok(cache)
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Initialize the cache schema and check version.
    fn init(&self) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS entries (
                key TEXT PRIMARY KEY,
                query_text TEXT NOT NULL,
                value TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        match stored_version {
            Some(v) if v == CACHE_VERSION => {}
            Some(v) => {
                tracing::info!(
                    found = v,
                    expected = CACHE_VERSION,
                    "cache version changed, clearing"
                );
                conn.execute("DELETE FROM entries", [])?;
                set_version(&conn)?;
            }
            None => set_version(&conn)?,
        }

        Ok(())
    }

    /// Look up `text`, ignoring expired entries.
    pub fn get(&self, text: &str) -> CacheResult<Option<ParsedQuery>> {
        self.get_at(text, now_millis())
    }

    /// Look up `text` as of `now_ms` (milliseconds since the Unix epoch).
    pub fn get_at(&self, text: &str, now_ms: i64) -> CacheResult<Option<ParsedQuery>> {
        self.get_key_at(&query_key(text), now_ms)
    }

    /// Look up `text` among parses made under `scope`.
    pub fn get_scoped(&self, scope: &str, text: &str) -> CacheResult<Option<ParsedQuery>> {
        self.get_key_at(&scoped_key(scope, text), now_millis())
    }

    fn get_key_at(&self, key: &str, now_ms: i64) -> CacheResult<Option<ParsedQuery>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT value FROM entries WHERE key = ? AND expires_at > ?",
                params![key, now_ms],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Store `parsed` under `text`, then enforce the size limit.
    pub fn put(&self, text: &str, parsed: &ParsedQuery) -> CacheResult<()> {
        self.put_at(text, parsed, now_millis())
    }

    /// Store `parsed` under `text` as of `now_ms`.
    pub fn put_at(&self, text: &str, parsed: &ParsedQuery, now_ms: i64) -> CacheResult<()> {
        self.put_key_at(&query_key(text), text, parsed, now_ms)
    }

    /// Store `parsed` under `text` among parses made under `scope`.
    pub fn put_scoped(&self, scope: &str, text: &str, parsed: &ParsedQuery) -> CacheResult<()> {
        self.put_key_at(&scoped_key(scope, text), text, parsed, now_millis())
    }

    fn put_key_at(
        &self,
        key: &str,
        text: &str,
        parsed: &ParsedQuery,
        now_ms: i64,
    ) -> CacheResult<()> {
        let json = serde_json::to_string(parsed)?;
        let ttl_ms = i64::try_from(self.policy.ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now_ms.saturating_add(ttl_ms);

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO entries (key, query_text, value, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?)",
            params![key, text.trim(), json, now_ms, expires_at],
        )?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        let excess = count - i64::try_from(self.policy.max_entries).unwrap_or(i64::MAX);
        if excess > 0 {
            conn.execute(
                "DELETE FROM entries WHERE key IN (
                     SELECT key FROM entries ORDER BY created_at ASC, rowid ASC LIMIT ?
                 )",
                params![excess],
            )?;
            tracing::debug!(evicted = excess, "evicted oldest cache entries");
        }
        Ok(())
    }

    /// Delete expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> CacheResult<usize> {
        self.purge_expired_at(now_millis())
    }

    pub fn purge_expired_at(&self, now_ms: i64) -> CacheResult<usize> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM entries WHERE expires_at <= ?", params![now_ms])?;
        Ok(rows)
    }

    /// Clear all cache entries (but keep metadata). Returns how many were removed.
    pub fn clear(&self) -> CacheResult<usize> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM entries", [])?;
        Ok(rows)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheResult<CacheStats> {
        let now_ms = now_millis();
        let conn = self.lock()?;
        let (entry_count, expired_count, total_size): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN expires_at <= ? THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(LENGTH(value)), 0)
             FROM entries",
            params![now_ms],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(CacheStats {
            entry_count: entry_count as usize,
            expired_count: expired_count as usize,
            total_size_bytes: total_size as usize,
        })
    }
}

/// Set the cache version in metadata.
fn set_version(conn: &Connection) -> CacheResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
        params![CACHE_VERSION.to_string()],
    )?;
    Ok(())
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
