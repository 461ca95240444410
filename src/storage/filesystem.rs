//! File system storage backend
//!
//! Implements StorageBackend with one file per key below a base directory.
//! Used by native apps.
//!
//! ## Security
//!
//! Keys are relative paths. Keys containing ".." or resolving outside the base
//! directory are rejected.
//!
//! ## Durability
//!
//! Values are written to a sibling temp file, flushed to disk and then renamed over
//! the target, so readers see either the old or the new value, never a torn write.
//! A failed write removes its temp file.

use super::{StorageBackend, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File system storage backend
pub struct FileSystemStorageBackend {
    base_path: PathBuf,
}

impl FileSystemStorageBackend {
    /// Create a new file system storage backend
    ///
    /// # Example
    ///
    /// ```rust
    /// use custom_export_sdk::storage::filesystem::FileSystemStorageBackend;
    ///
    /// let backend = FileSystemStorageBackend::new("/var/lib/exports");
    /// ```
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Map a key to a path under the base directory
    fn resolve_key(&self, key: &str) -> Result<PathBuf, StorageError> {
        let normalized = key.trim_start_matches('/');
        if normalized.is_empty() {
            return Err(StorageError::PermissionDenied("Empty key".to_string()));
        }

        let relative = Path::new(normalized);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::PermissionDenied(format!(
                "Key {} must be a plain relative path",
                key
            )));
        }

        let full = self.base_path.join(relative);

        // An existing parent must not escape the base (symlinks)
        if let Some(parent) = full.parent()
            && parent.exists()
        {
            let parent_canonical = parent.canonicalize().map_err(|e| {
                StorageError::IoError(format!("Failed to resolve parent path: {}", e))
            })?;
            let base_canonical = self
                .base_path
                .canonicalize()
                .unwrap_or_else(|_| self.base_path.clone());
            if !parent_canonical.starts_with(&base_canonical) {
                return Err(StorageError::PermissionDenied(
                    "Key escapes base directory".to_string(),
                ));
            }
        }

        Ok(full)
    }
}

/// Write `bytes` to `path` and flush them to disk
async fn stage(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes).await?;
    fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await?
        .sync_all()
        .await
}

#[async_trait(?Send)]
impl StorageBackend for FileSystemStorageBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.resolve_key(key)?;

        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => Err(StorageError::SerializationError(
                format!("Value under {} is not valid UTF-8: {}", key, e),
            )),
            Err(e) => Err(StorageError::IoError(format!(
                "Failed to read {}: {}",
                key, e
            ))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.resolve_key(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::IoError(format!("Failed to create directory for {}: {}", key, e))
            })?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        if let Err(e) = stage(&tmp_path, value.as_bytes()).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::IoError(format!(
                "Failed to write {}: {}",
                key, e
            )));
        }
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::IoError(format!(
                "Failed to replace {}: {}",
                key, e
            )));
        }

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve_key(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(format!(
                "Failed to remove {}: {}",
                key, e
            ))),
        }
    }
}
