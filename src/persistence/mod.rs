//! Key/value persistence
//!
//! Everything the game remembers (settings, progress, leaderboards) is a JSON
//! document under a `lumina_voyage_` key. Stores return [`StorageError`];
//! the game-facing helpers log failures and fall back to defaults.

#[cfg(target_arch = "wasm32")]
mod local;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Prefix shared by every persisted key
pub const KEY_PREFIX: &str = "lumina_voyage_";

pub fn storage_key(name: &str) -> String {
    format!("{}{}", KEY_PREFIX, name)
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not available")]
    Unavailable,
    #[error("failed to write '{key}': {reason}")]
    Write { key: String, reason: String },
    #[error("failed to read '{key}': {reason}")]
    Read { key: String, reason: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// String key/value backend
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store (native builds and tests)
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub(crate) values: HashMap<String, String>,
    /// Simulate a full or blocked storage
    pub reject_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::Write {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Read and decode a document; missing, unreadable or malformed data is `None`
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, name: &str) -> Option<T> {
    let key = storage_key(name);
    let raw = match store.get(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("{}", e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding malformed '{}': {}", key, e);
            None
        }
    }
}

/// Encode and write a document
pub fn save_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    name: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    store.set(&storage_key(name), &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        n: u32,
    }

    #[test]
    fn test_roundtrip_uses_prefixed_key() {
        let mut store = MemoryStore::new();
        save_json(&mut store, "doc", &Doc { n: 3 }).unwrap();
        assert!(store.get("lumina_voyage_doc").unwrap().is_some());
        assert_eq!(load_json::<Doc>(&store, "doc"), Some(Doc { n: 3 }));
    }

    #[test]
    fn test_malformed_document_is_none() {
        let mut store = MemoryStore::new();
        store.set("lumina_voyage_doc", "{ nope").unwrap();
        assert_eq!(load_json::<Doc>(&store, "doc"), None);
        assert_eq!(load_json::<Doc>(&store, "missing"), None);
    }

    #[test]
    fn test_rejected_write_is_an_error() {
        let mut store = MemoryStore {
            reject_writes: true,
            ..Default::default()
        };
        let err = save_json(&mut store, "doc", &Doc { n: 1 }).unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
        assert!(store.is_empty());
    }
}
