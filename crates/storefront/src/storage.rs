//! Durable keyed string storage.
//!
//! The cart mirror, per-resource caches, and the chat transcript all live
//! in a small key-value store modeled after browser local storage: string
//! keys, string values, best-effort writes. Corrupt or missing data is
//! always treated as "no prior state," never surfaced to the user.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::warn;

/// Storage key for the serialized cart mirror.
pub const CART_KEY: &str = "cart";

/// Storage key for the chat transcript.
pub const CHAT_KEY: &str = "chat";

/// Errors raised by storage writes.
///
/// Callers treat these as best-effort failures: log and continue.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure (quota, permissions, disk).
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be re-serialized.
    #[error("storage encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Keyed string storage with `get`/`set`/`remove`.
///
/// Implementations must be safe to share across tasks; all methods take
/// `&self` and synchronize internally.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `None` when absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the write cannot be made durable.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key is a no-op.
    fn remove(&self, key: &str);
}

// =============================================================================
// In-memory store
// =============================================================================

/// Volatile in-memory store, used for session-scoped data and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// Durable store backed by a single JSON object file.
///
/// A missing or corrupt file starts the store empty; the parse failure is
/// logged once at load. Every `set`/`remove` rewrites the file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open a store at `path`, loading any existing entries.
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt storage file, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if entries.remove(key).is_some()
            && let Err(e) = self.flush(&entries)
        {
            warn!(key, error = %e, "Failed to flush storage after remove");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("cart").is_none());
        store.set("cart", "[]").expect("set");
        assert_eq!(store.get("cart").as_deref(), Some("[]"));
        store.remove("cart");
        assert!(store.get("cart").is_none());
    }

    #[test]
    fn test_memory_store_remove_absent_is_noop() {
        let store = MemoryStore::new();
        store.remove("missing");
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.json");

        let store = JsonFileStore::open(&path);
        store.set("chat", "[\"hello\"]").expect("set");
        drop(store);

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("chat").as_deref(), Some("[\"hello\"]"));
    }

    #[test]
    fn test_file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").expect("write");

        let store = JsonFileStore::open(&path);
        assert!(store.get("cart").is_none());
        store.set("cart", "[]").expect("set survives corrupt load");
    }

    #[test]
    fn test_file_store_missing_file_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::open(dir.path().join("absent.json"));
        assert!(store.get("anything").is_none());
    }
}
