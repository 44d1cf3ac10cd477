use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

/// Default entry TTL in minutes.
/// Matches the staleness window the client tolerates for profile lookups.
const DEFAULT_TTL_MINUTES: i64 = 5;

/// A cached value with its absolute expiry.
///
/// The expiry is fixed once at write time; readers never extend it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(value: serde_json::Value, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// In-memory key/value cache with per-entry TTL.
///
/// Expired entries behave as absent and are evicted on access; there is
/// no background sweep. Mutated only from the owning event-loop turn, so
/// no locking is needed.
#[derive(Debug, Default)]
pub struct ClientCache {
    entries: HashMap<String, CacheEntry>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_ttl() -> Duration {
        Duration::minutes(DEFAULT_TTL_MINUTES)
    }

    /// Store a value under a key with the default TTL.
    pub fn set_item(&mut self, key: &str, value: serde_json::Value) {
        self.set_item_with_ttl(key, value, Self::default_ttl());
    }

    /// Store a value under a key; expiry = now + ttl, fixed at write time.
    pub fn set_item_with_ttl(&mut self, key: &str, value: serde_json::Value, ttl: Duration) {
        self.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
    }

    /// Fetch a value if its entry is still live.
    ///
    /// An expired entry is evicted here and reported as absent, so a
    /// second read of the same key is also absent.
    pub fn get_item(&mut self, key: &str) -> Option<&serde_json::Value> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return None,
        };
        if expired {
            debug!(key, "Evicting expired cache entry");
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| &e.value)
    }

    /// Serialize a typed value into the cache with the default TTL.
    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> serde_json::Result<()> {
        let raw = serde_json::to_value(value)?;
        self.set_item(key, raw);
        Ok(())
    }

    /// Fetch and deserialize a typed value, treating parse failures as
    /// absent (a stale shape is no better than a missing entry).
    pub fn get_json<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let raw = self.get_item(key)?.clone();
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Cached value failed to deserialize, dropping");
                self.entries.remove(key);
                None
            }
        }
    }

    /// Drop all entries. Called only from expiry handling and logout.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of the live entries, for persistence.
    pub fn export(&self) -> HashMap<String, CacheEntry> {
        self.entries.clone()
    }

    /// Restore entries from a persisted snapshot, skipping any that
    /// expired while the process was down.
    pub fn import(&mut self, entries: HashMap<String, CacheEntry>) {
        for (key, entry) in entries {
            if !entry.is_expired() {
                self.entries.insert(key, entry);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
