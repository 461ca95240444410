//! Browser storage backend
//!
//! Implements StorageBackend on top of `window.localStorage`.
//! Used by WASM apps. localStorage is synchronous, so a write has landed by the
//! time `write` returns.

use super::{StorageBackend, StorageError};
use async_trait::async_trait;
use web_sys::Storage;

/// Browser storage backend using localStorage
pub struct BrowserStorageBackend {
    prefix: String,
}

impl BrowserStorageBackend {
    /// Create a backend; every key is stored as `{prefix}{key}`
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use custom_export_sdk::storage::browser::BrowserStorageBackend;
    ///
    /// let backend = BrowserStorageBackend::new("");
    /// ```
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Get localStorage instance
    fn get_local_storage(&self) -> Result<Storage, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::BackendError("Window not available".to_string()))?;

        window
            .local_storage()
            .map_err(|e| {
                StorageError::BackendError(format!("localStorage not available: {:?}", e))
            })?
            .ok_or_else(|| StorageError::BackendError("localStorage is None".to_string()))
    }
}

#[async_trait(?Send)]
impl StorageBackend for BrowserStorageBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let storage = self.get_local_storage()?;
        storage.get_item(&self.full_key(key)).map_err(|e| {
            StorageError::BackendError(format!("Failed to read from localStorage: {:?}", e))
        })
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = self.get_local_storage()?;
        // Quota errors surface here
        storage.set_item(&self.full_key(key), value).map_err(|e| {
            StorageError::BackendError(format!("Failed to write to localStorage: {:?}", e))
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let storage = self.get_local_storage()?;
        storage.remove_item(&self.full_key(key)).map_err(|e| {
            StorageError::BackendError(format!("Failed to remove from localStorage: {:?}", e))
        })
    }
}
