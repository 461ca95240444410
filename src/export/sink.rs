//! Delivery of finished exports
//!
//! A sink only ever receives a complete [`ExportArtifact`]; failed exports never
//! reach it, so no partial file is delivered.

use crate::export::{ExportArtifact, ExportError};
use async_trait::async_trait;
use std::sync::Mutex;

/// Destination for finished export files
#[async_trait(?Send)]
pub trait ArtifactSink {
    async fn deliver(&self, artifact: &ExportArtifact) -> Result<(), ExportError>;
}

/// Keeps delivered artifacts in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<ExportArtifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifacts delivered so far, oldest first
    pub fn delivered(&self) -> Vec<ExportArtifact> {
        self.delivered
            .lock()
            .map(|items| items.clone())
            .unwrap_or_default()
    }
}

#[async_trait(?Send)]
impl ArtifactSink for MemorySink {
    async fn deliver(&self, artifact: &ExportArtifact) -> Result<(), ExportError> {
        self.delivered
            .lock()
            .map_err(|e| ExportError::Io(format!("Sink lock poisoned: {}", e)))?
            .push(artifact.clone());
        Ok(())
    }
}

#[cfg(feature = "native-fs")]
pub use directory::DirectorySink;

#[cfg(feature = "native-fs")]
mod directory {
    use super::*;
    use std::path::{Path, PathBuf};
    use tracing::info;

    /// Writes artifacts as files into a directory
    pub struct DirectorySink {
        dir: PathBuf,
    }

    impl DirectorySink {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        pub fn dir(&self) -> &Path {
            &self.dir
        }

        /// Where an artifact ends up
        pub fn path_for(&self, artifact: &ExportArtifact) -> PathBuf {
            self.dir.join(&artifact.filename)
        }
    }

    #[async_trait(?Send)]
    impl ArtifactSink for DirectorySink {
        async fn deliver(&self, artifact: &ExportArtifact) -> Result<(), ExportError> {
            tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
                ExportError::Io(format!(
                    "Failed to create directory {}: {}",
                    self.dir.display(),
                    e
                ))
            })?;

            // Temp file in the same directory, then rename over the target
            let path = self.path_for(artifact);
            let tmp = self.dir.join(format!(".{}.tmp", artifact.filename));
            if let Err(e) = tokio::fs::write(&tmp, &artifact.content).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(ExportError::Io(format!(
                    "Failed to write {}: {}",
                    tmp.display(),
                    e
                )));
            }
            if let Err(e) = tokio::fs::rename(&tmp, &path).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(ExportError::Io(format!(
                    "Failed to move export to {}: {}",
                    path.display(),
                    e
                )));
            }

            info!("Wrote {} ({} bytes)", path.display(), artifact.content.len());
            Ok(())
        }
    }
}

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub use browser::BrowserDownloadSink;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod browser {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;
    use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

    /// The object URL stays valid this long after the click
    const REVOKE_DELAY_MS: i32 = 10_000;

    /// Triggers a browser download through a temporary object URL
    #[derive(Debug, Default)]
    pub struct BrowserDownloadSink;

    fn js_err(context: &str, e: wasm_bindgen::JsValue) -> ExportError {
        ExportError::Io(format!("{}: {:?}", context, e))
    }

    #[async_trait(?Send)]
    impl ArtifactSink for BrowserDownloadSink {
        async fn deliver(&self, artifact: &ExportArtifact) -> Result<(), ExportError> {
            let window = web_sys::window()
                .ok_or_else(|| ExportError::Io("Window not available".to_string()))?;
            let document = window
                .document()
                .ok_or_else(|| ExportError::Io("Document not available".to_string()))?;

            let bytes = js_sys::Uint8Array::from(artifact.content.as_slice());
            let parts = js_sys::Array::of1(&bytes);
            let options = BlobPropertyBag::new();
            options.set_type(artifact.mime_type);
            let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
                .map_err(|e| js_err("Failed to create blob", e))?;
            let url = Url::create_object_url_with_blob(&blob)
                .map_err(|e| js_err("Failed to create object URL", e))?;

            let anchor: HtmlAnchorElement = document
                .create_element("a")
                .map_err(|e| js_err("Failed to create anchor", e))?
                .dyn_into()
                .map_err(|_| ExportError::Io("Element is not an anchor".to_string()))?;
            anchor.set_href(&url);
            anchor.set_download(&artifact.filename);
            anchor.click();

            // Revoking right after the click can cancel the download in some browsers
            let revoke = Closure::once_into_js(move || {
                let _ = Url::revoke_object_url(&url);
            });
            window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    revoke.unchecked_ref(),
                    REVOKE_DELAY_MS,
                )
                .map_err(|e| js_err("Failed to schedule object URL revoke", e))?;
            Ok(())
        }
    }
}
