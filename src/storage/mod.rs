//! Client-side key-value storage
//!
//! The console persists small state blobs (cached snapshots, the signed-in
//! user, login-attempt counters) through an injected storage port so the
//! backing store can be swapped for an in-memory fake in tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::utils::errors::{Result, VinsmokeError};

/// Namespaced string key-value port. Implementations must be cheap to call
/// from synchronous contexts; callers treat every error as a miss.
pub trait StoragePort: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;

    /// Remove every key carrying the given namespace prefix (logout wipe)
    fn clear_prefix(&self, prefix: &str) -> Result<u32> {
        let mut removed = 0;
        for key in self.keys()? {
            if key.starts_with(prefix) {
                self.remove_item(&key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// In-memory store for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| VinsmokeError::Storage("memory store poisoned".to_string()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| VinsmokeError::Storage("memory store poisoned".to_string()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| VinsmokeError::Storage("memory store poisoned".to_string()))?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| VinsmokeError::Storage("memory store poisoned".to_string()))?;
        Ok(items.keys().cloned().collect())
    }
}

/// File-backed store: one JSON map per console installation, written
/// atomically via a temp file so a crash never leaves a torn map behind
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or create) the store file under the given directory
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("console_storage.json");

        let items = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Discarding unreadable storage file");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        debug!(path = %path.display(), entries = items.len(), "Storage file opened");
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    fn persist(&self, items: &HashMap<String, String>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(items)?;
        let tmp = self
            .path
            .with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StoragePort for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| VinsmokeError::Storage("file store poisoned".to_string()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| VinsmokeError::Storage("file store poisoned".to_string()))?;
        items.insert(key.to_string(), value.to_string());
        self.persist(&items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| VinsmokeError::Storage("file store poisoned".to_string()))?;
        if items.remove(key).is_some() {
            self.persist(&items)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| VinsmokeError::Storage("file store poisoned".to_string()))?;
        Ok(items.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.set_item("vinsmoke_user", "{\"id\":1}").unwrap();

        assert_eq!(
            store.get_item("vinsmoke_user").unwrap().as_deref(),
            Some("{\"id\":1}")
        );

        store.remove_item("vinsmoke_user").unwrap();
        assert!(store.get_item("vinsmoke_user").unwrap().is_none());
    }

    #[test]
    fn test_clear_prefix_only_touches_namespace() {
        let store = MemoryStore::new();
        store.set_item("vinsmoke_user", "a").unwrap();
        store.set_item("vinsmoke_public_data", "b").unwrap();
        store.set_item("other_app_key", "c").unwrap();

        let removed = store.clear_prefix("vinsmoke_").unwrap();
        assert_eq!(removed, 2);
        assert!(store.get_item("vinsmoke_user").unwrap().is_none());
        assert_eq!(store.get_item("other_app_key").unwrap().as_deref(), Some("c"));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.set_item("vinsmoke_admin_data", "{\"faqs\":[]}").unwrap();
        }

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get_item("vinsmoke_admin_data").unwrap().as_deref(),
            Some("{\"faqs\":[]}")
        );
    }

    #[test]
    fn test_file_store_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("console_storage.json"), "{not json").unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }
}
