//! In-memory storage backend

use super::{StorageBackend, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Storage backend holding values in process memory
#[derive(Debug, Default)]
pub struct MemoryStorageBackend {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a backend with existing entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    fn lock_error() -> StorageError {
        StorageError::BackendError("memory store lock poisoned".to_string())
    }
}

#[async_trait(?Send)]
impl StorageBackend for MemoryStorageBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.read().map_err(|_| Self::lock_error())?;
        Ok(values.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.write().map_err(|_| Self::lock_error())?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.write().map_err(|_| Self::lock_error())?;
        values.remove(key);
        Ok(())
    }
}
