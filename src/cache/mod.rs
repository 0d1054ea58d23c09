//! TTL data cache
//!
//! Expiring snapshot cache layered over the storage port. Every entry is a
//! JSON envelope carrying its own creation and expiry timestamps; expiry is
//! enforced lazily on read. Storage failures are never surfaced to callers,
//! a broken store just degrades to a permanent cache miss.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::StoragePort;

/// Cache key for the aggregate public dataset
pub const PUBLIC_DATA: &str = "public_data";
/// Cache key for the bulk admin snapshot
pub const ADMIN_DATA: &str = "admin_data";

/// Stored envelope; `expires` is always `timestamp + TTL`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Epoch milliseconds at write time
    pub timestamp: i64,
    /// Epoch milliseconds after which reads miss
    pub expires: i64,
}

/// Debugging view of a cache slot
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub exists: bool,
    pub expired: bool,
    pub remaining_minutes: i64,
    pub size_bytes: usize,
}

/// Expiring key-value cache over persistent storage
#[derive(Clone)]
pub struct DataCache {
    store: Arc<dyn StoragePort>,
    prefix: String,
    ttl_ms: i64,
}

impl DataCache {
    pub fn new(store: Arc<dyn StoragePort>, prefix: &str, ttl_seconds: u64) -> Self {
        Self {
            store,
            prefix: prefix.to_string(),
            ttl_ms: (ttl_seconds as i64) * 1000,
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Store a value with a fresh TTL window. Failures are logged and
    /// swallowed; the next read simply misses.
    pub fn set<T: Serialize>(&self, key: &str, data: &T) {
        let now = Utc::now().timestamp_millis();
        let entry = CacheEntry {
            data,
            timestamp: now,
            expires: now + self.ttl_ms,
        };

        let full_key = self.full_key(key);
        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!(key = %full_key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        match self.store.set_item(&full_key, &serialized) {
            Ok(()) => debug!(key = %full_key, ttl_ms = self.ttl_ms, "Cache entry written"),
            Err(e) => warn!(key = %full_key, error = %e, "Cache write failed"),
        }
    }

    /// Fetch a value if its TTL window is still open. An expired entry is
    /// deleted and reported as a miss; so is anything unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        let entry = self.read_entry::<T>(&full_key)?;

        let now = Utc::now().timestamp_millis();
        if now > entry.expires {
            debug!(key = %full_key, "Cache entry expired");
            let _ = self.store.remove_item(&full_key);
            return None;
        }

        let remaining = (entry.expires - now) / 60_000;
        debug!(key = %full_key, remaining_minutes = remaining, "Cache hit");
        Some(entry.data)
    }

    /// Fetch a value regardless of expiry. Used as a last resort when the
    /// network fetch fails and stale data beats no data.
    pub fn get_stale<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        self.read_entry::<T>(&full_key).map(|entry| {
            debug!(key = %full_key, "Serving stale cache entry");
            entry.data
        })
    }

    /// Remove one entry unconditionally
    pub fn clear(&self, key: &str) {
        let full_key = self.full_key(key);
        if let Err(e) = self.store.remove_item(&full_key) {
            warn!(key = %full_key, error = %e, "Cache clear failed");
        }
    }

    /// Remove every entry under the cache namespace
    pub fn clear_all(&self) {
        match self.store.clear_prefix(&self.prefix) {
            Ok(removed) => debug!(removed = removed, "Cache namespace cleared"),
            Err(e) => warn!(error = %e, "Cache namespace clear failed"),
        }
    }

    /// Check whether a live entry exists without deserializing its payload
    pub fn is_valid(&self, key: &str) -> bool {
        self.get::<serde_json::Value>(key).is_some()
    }

    /// Debugging view of a cache slot
    pub fn cache_info(&self, key: &str) -> CacheInfo {
        let full_key = self.full_key(key);
        let raw = match self.store.get_item(&full_key) {
            Ok(Some(raw)) => raw,
            _ => {
                return CacheInfo {
                    exists: false,
                    expired: false,
                    remaining_minutes: 0,
                    size_bytes: 0,
                }
            }
        };

        match serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw) {
            Ok(entry) => {
                let now = Utc::now().timestamp_millis();
                CacheInfo {
                    exists: true,
                    expired: now > entry.expires,
                    remaining_minutes: ((entry.expires - now).max(0)) / 60_000,
                    size_bytes: raw.len(),
                }
            }
            Err(_) => CacheInfo {
                exists: false,
                expired: false,
                remaining_minutes: 0,
                size_bytes: raw.len(),
            },
        }
    }

    fn read_entry<T: DeserializeOwned>(&self, full_key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.store.get_item(full_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %full_key, error = %e, "Cache read failed");
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %full_key, error = %e, "Removing corrupt cache entry");
                let _ = self.store.remove_item(full_key);
                None
            }
        }
    }
}

impl std::fmt::Debug for DataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCache")
            .field("prefix", &self.prefix)
            .field("ttl_ms", &self.ttl_ms)
            .finish_non_exhaustive()
    }
}
