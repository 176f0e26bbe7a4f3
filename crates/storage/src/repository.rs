use async_trait::async_trait;
use course_core::model::Module;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::builtin::BuiltinCatalog;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable key-value store used for progress and app-state snapshots.
///
/// Each call is assumed atomic; durability may lag behind a successful `set`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read-only bulk source of the course catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every module with its videos attached.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the source is unreachable or holds rows that
    /// do not form valid modules.
    async fn fetch_modules(&self) -> Result<Vec<Module>, StorageError>;
}

/// Simple in-memory key-value store for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the key-value store and catalog source behind trait objects.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
    pub catalog: Arc<dyn CatalogSource>,
}

impl Storage {
    /// In-memory snapshots over the bundled sample catalog.
    #[must_use]
    pub fn in_memory() -> Self {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryRepository::new());
        let catalog: Arc<dyn CatalogSource> = Arc::new(BuiltinCatalog);
        Self { kv, catalog }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_get_set_remove() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get("k").await.unwrap(), None);

        repo.set("k", b"one").await.unwrap();
        repo.set("k", b"two").await.unwrap();
        assert_eq!(repo.get("k").await.unwrap().as_deref(), Some(&b"two"[..]));

        repo.remove("k").await.unwrap();
        repo.remove("k").await.unwrap();
        assert_eq!(repo.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let repo = InMemoryRepository::new();
        let other = repo.clone();
        repo.set("shared", b"x").await.unwrap();
        assert!(other.get("shared").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn in_memory_storage_serves_builtin_catalog() {
        let storage = Storage::in_memory();
        let modules = storage.catalog.fetch_modules().await.unwrap();
        assert_eq!(modules.len(), 4);
    }
}
