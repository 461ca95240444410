//! Storage backend abstraction
//!
//! Defines the key-value StorageBackend trait the template store and row sources
//! persist through, and implementations for different storage systems:
//! - MemoryStorageBackend: process memory (tests, embedders)
//! - FileSystemStorageBackend: native file system (for native apps)
//! - BrowserStorageBackend: browser localStorage (for WASM apps)

use async_trait::async_trait;
use std::sync::Arc;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Trait for storage backends
///
/// A write must be durable by the time the returned future resolves, and a read
/// issued afterwards must observe it.
#[async_trait(?Send)]
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`, `None` if absent
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.read(key).await?.is_some())
    }
}

#[async_trait(?Send)]
impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key).await
    }
}

pub mod memory;

#[cfg(feature = "native-fs")]
pub mod filesystem;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub mod browser;

pub use memory::MemoryStorageBackend;
