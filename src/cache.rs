// src/cache.rs
//! In-process TTL cache sitting in front of the fetch pipeline.
//!
//! Entries are evicted lazily: an expired entry is dropped by the `get`
//! that observes it, and a read at or past expiry is an ordinary miss,
//! never a synchronous refetch.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::debug;
use serde_json::Value;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: DateTime<Utc>,
}

/// A shared in-memory cache keyed by string, with per-entry TTLs.
///
/// Safe for concurrent use; lookups and writes are short synchronous
/// operations that never suspend.
#[derive(Debug)]
pub struct VolatileCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl_secs: u64,
}

impl VolatileCache {
    pub fn new(default_ttl_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl_secs,
        }
    }

    /// Returns the cached value for `key`, or `None` on a miss.
    /// An entry past its expiry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => {
                debug!("Cache HIT for key: {}", key);
                Some(entry.value.clone())
            }
            Some(entry) => {
                let expired_at = entry.expires_at;
                drop(entry); // release the shard before removing
                // A concurrent set may have replaced the entry since the
                // lookup; only evict one that is still expired.
                self.entries.remove_if(key, |_, e| e.expires_at <= Utc::now());
                debug!("Cache EXPIRED for key: {} (expired at {})", key, expired_at);
                None
            }
            None => {
                debug!("Cache MISS for key: {}", key);
                None
            }
        }
    }

    /// Stores `value` under `key`, overwriting any previous entry.
    /// Falls back to the default TTL when `ttl_secs` is `None`. TTLs too
    /// large to represent saturate to a far-future expiry.
    pub fn set(&self, key: &str, value: Value, ttl_secs: Option<u64>) {
        let ttl = ttl_secs.unwrap_or(self.default_ttl_secs);
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(key.to_string(), CacheEntry { value, expires_at });
        debug!("Cache SET for key: {} with TTL: {}s", key, ttl);
    }

    /// Drops every entry. Administrative use and tests.
    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        debug!("Cache cleared ({} entries dropped)", count);
    }

    /// Number of entries currently held, including any not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
