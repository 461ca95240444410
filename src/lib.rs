//! Custom Export SDK - field selection, templates and multi-format export
//!
//! Provides unified interfaces for:
//! - Field catalogs (static or fetched from a metadata service)
//! - Per-entity field selection with renaming and reordering
//! - Saved export templates (via storage backends)
//! - Synthetic preview data and display formatting
//! - CSV, XLSX, XML, JSON and PDF export
//!
//! [`ExportSession`] ties these together for one editing session.

pub mod catalog;
pub mod config;
pub mod export;
pub mod format;
pub mod models;
pub mod preview;
pub mod selection;
pub mod session;
pub mod storage;
pub mod templates;

// Re-export commonly used types
pub use storage::{MemoryStorageBackend, StorageBackend, StorageError};
#[cfg(feature = "native-fs")]
pub use storage::filesystem::FileSystemStorageBackend;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub use storage::browser::BrowserStorageBackend;

pub use catalog::{CatalogError, FieldCatalog, StaticFieldCatalog};
#[cfg(feature = "api-backend")]
pub use catalog::ApiCatalogClient;
pub use config::SdkConfig;
pub use export::{
    ArtifactSink, CancellationFlag, ExportArtifact, ExportColumn, ExportConfig, ExportError,
    ExportFormat, ExportRequest, ExportSubject, Exporter, MemorySink, PdfOptions,
};
#[cfg(feature = "native-fs")]
pub use export::DirectorySink;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub use export::sink::BrowserDownloadSink;
pub use format::{DisplayConfig, ValueFormatter, format_value};
pub use preview::{
    PreviewConfig, PreviewGenerator, PreviewTable, RowSource, RowSourceError, StorageRowSource,
    SyntheticRowSource,
};
pub use selection::{MoveDirection, SelectionError, SelectionModel};
pub use session::{ExportSession, SessionError};
pub use templates::{TemplateConfig, TemplateError, TemplateStore, load_template};

// Re-export models
pub use models::{
    EntityDescriptor, ExportTemplate, FieldDescriptor, FieldKey, FieldType, FieldValue, Record,
    Row, SelectedField, TemplateColumn,
};
