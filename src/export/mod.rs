//! Export functionality
//!
//! Turns an ordered column list and a set of records into a downloadable file.
//! Supported formats:
//! - CSV
//! - XLSX (single worksheet, bold header row)
//! - XML
//! - JSON
//! - PDF (generated directly, no print dialog)
//!
//! Every export goes through the same steps: validate the columns, cap the row
//! count, re-key each record from field ids to output labels (keeping column order),
//! then hand the table to the format writer. Nothing reaches an [`ArtifactSink`]
//! unless the writer finished successfully.

pub mod csv;
pub mod json;
pub mod pdf;
pub mod sink;
pub mod xlsx;
pub mod xml;

use crate::models::{FieldValue, Record, SelectedField};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

pub use pdf::{PageOrientation, PageSize, PdfOptions, PdfWriter};
pub use sink::{ArtifactSink, MemorySink};
#[cfg(feature = "native-fs")]
pub use sink::DirectorySink;

/// Default hard ceiling on exported rows
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Default subject for exports combining several entities
pub const DEFAULT_COMBINED_SUBJECT: &str = "combined";

/// Records are checked for cancellation every this many rows
const CANCEL_CHECK_INTERVAL: usize = 1_000;

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Export cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    Io(String),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Xml,
    Json,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Csv,
        ExportFormat::Xlsx,
        ExportFormat::Xml,
        ExportFormat::Json,
        ExportFormat::Pdf,
    ];

    /// File extension, also the format's canonical name
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Xml => "xml",
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Xml => "application/xml;charset=utf-8",
            ExportFormat::Json => "application/json;charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.extension() == wanted)
            .ok_or_else(|| ExportError::UnsupportedFormat(s.to_string()))
    }
}

/// One output column: `id` addresses the row data, `label` becomes the header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportColumn {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

impl ExportColumn {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            entity_id: None,
        }
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }
}

impl From<&SelectedField> for ExportColumn {
    fn from(selected: &SelectedField) -> Self {
        ExportColumn::new(&selected.field.id, &selected.display_name)
            .with_entity(&selected.entity_id)
    }
}

/// What the exported file is about; determines the file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSubject {
    Entity(String),
    /// Columns from several entities
    Combined,
}

/// A fully specified export
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub subject: ExportSubject,
    pub columns: Vec<ExportColumn>,
    pub format: ExportFormat,
}

impl ExportRequest {
    pub fn for_entity(
        entity_id: impl Into<String>,
        columns: Vec<ExportColumn>,
        format: ExportFormat,
    ) -> Self {
        Self {
            subject: ExportSubject::Entity(entity_id.into()),
            columns,
            format,
        }
    }

    pub fn combined(columns: Vec<ExportColumn>, format: ExportFormat) -> Self {
        Self {
            subject: ExportSubject::Combined,
            columns,
            format,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Hard ceiling on data rows per file
    pub max_rows: usize,
    /// File subject used for multi-entity exports
    pub combined_subject: String,
    pub pdf: PdfOptions,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            combined_subject: DEFAULT_COMBINED_SUBJECT.to_string(),
            pdf: PdfOptions::default(),
        }
    }
}

/// A finished export file, held in memory until delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// `{subject}-export.{ext}`
    pub filename: String,
    pub format: ExportFormat,
    pub mime_type: &'static str,
    /// Data rows written (header excluded)
    pub row_count: usize,
    pub content: Vec<u8>,
}

impl ExportArtifact {
    /// Content as base64, for hand-off to a JavaScript host
    pub fn content_base64(&self) -> String {
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &self.content)
    }

    /// Content as UTF-8 text (all formats except XLSX and PDF)
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// Shared cancellation switch for a running export
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ExportError> {
        if self.is_cancelled() {
            Err(ExportError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Records re-keyed to output labels, columns in declared order
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<FieldValue>>,
}

impl LabeledTable {
    /// Header/value pairs of one row, in column order
    pub fn row_pairs(&self, index: usize) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.rows.get(index).into_iter().flatten())
    }
}

/// Reject column lists the writers cannot represent faithfully
pub fn validate_columns(columns: &[ExportColumn]) -> Result<(), ExportError> {
    if columns.is_empty() {
        return Err(ExportError::Validation(
            "Select at least one field to export".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for column in columns {
        if column.label.trim().is_empty() {
            return Err(ExportError::Validation(format!(
                "Column {} has an empty label",
                column.id
            )));
        }
        if !seen.insert(column.label.as_str()) {
            return Err(ExportError::Validation(format!(
                "Duplicate column label {}",
                column.label
            )));
        }
    }
    Ok(())
}

/// Re-key at most `max_rows` records from field ids to column labels.
///
/// Values missing from a record become [`FieldValue::Null`].
pub fn rekey_records(
    columns: &[ExportColumn],
    records: &[Record],
    max_rows: usize,
    cancel: &CancellationFlag,
) -> Result<LabeledTable, ExportError> {
    let headers = columns.iter().map(|c| c.label.clone()).collect();
    let mut rows = Vec::with_capacity(records.len().min(max_rows));
    for (index, record) in records.iter().take(max_rows).enumerate() {
        if index % CANCEL_CHECK_INTERVAL == 0 {
            cancel.check()?;
        }
        rows.push(
            columns
                .iter()
                .map(|c| {
                    record
                        .get(c.entity_id.as_deref(), &c.id)
                        .cloned()
                        .unwrap_or_default()
                })
                .collect(),
        );
    }
    Ok(LabeledTable { headers, rows })
}

/// Runs exports according to an [`ExportConfig`]
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// File name for a subject and format
    pub fn filename(&self, subject: &ExportSubject, format: ExportFormat) -> String {
        let subject = match subject {
            ExportSubject::Entity(id) => sanitize_subject(id),
            ExportSubject::Combined => sanitize_subject(&self.config.combined_subject),
        };
        format!("{}-export.{}", subject, format.extension())
    }

    pub fn export(
        &self,
        request: &ExportRequest,
        records: &[Record],
    ) -> Result<ExportArtifact, ExportError> {
        self.export_with_cancellation(request, records, &CancellationFlag::new())
    }

    /// Run an export that stops with [`ExportError::Cancelled`] once `cancel` is set
    pub fn export_with_cancellation(
        &self,
        request: &ExportRequest,
        records: &[Record],
        cancel: &CancellationFlag,
    ) -> Result<ExportArtifact, ExportError> {
        validate_columns(&request.columns)?;
        if self.config.max_rows == 0 {
            return Err(ExportError::Validation(
                "max_rows must be greater than zero".to_string(),
            ));
        }
        cancel.check()?;

        if records.len() > self.config.max_rows {
            warn!(
                "Export truncated from {} to {} rows",
                records.len(),
                self.config.max_rows
            );
        }
        let table = rekey_records(&request.columns, records, self.config.max_rows, cancel)?;
        cancel.check()?;

        let filename = self.filename(&request.subject, request.format);
        let content = match request.format {
            ExportFormat::Csv => csv::write_csv(&table)?,
            ExportFormat::Xlsx => xlsx::write_xlsx(&table)?,
            ExportFormat::Xml => xml::write_xml(&table)?,
            ExportFormat::Json => json::write_json(&table)?,
            ExportFormat::Pdf => {
                let title = filename
                    .strip_suffix(".pdf")
                    .unwrap_or(filename.as_str())
                    .to_string();
                PdfWriter::new(self.config.pdf.clone()).write(&title, &table)?
            }
        };
        cancel.check()?;

        info!(
            "Exported {} rows as {} ({} bytes) to {}",
            table.rows.len(),
            request.format,
            content.len(),
            filename
        );
        Ok(ExportArtifact {
            filename,
            format: request.format,
            mime_type: request.format.mime_type(),
            row_count: table.rows.len(),
            content,
        })
    }

    /// Run the export on the blocking thread pool
    #[cfg(feature = "native-fs")]
    pub async fn export_in_background(
        &self,
        request: ExportRequest,
        records: Vec<Record>,
        cancel: CancellationFlag,
    ) -> Result<ExportArtifact, ExportError> {
        let exporter = self.clone();
        tokio::task::spawn_blocking(move || {
            exporter.export_with_cancellation(&request, &records, &cancel)
        })
        .await
        .map_err(|e| ExportError::Serialization(format!("Export task failed: {}", e)))?
    }
}

/// Keep file names free of path separators and other awkward characters
fn sanitize_subject(subject: &str) -> String {
    let cleaned: String = subject
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        DEFAULT_COMBINED_SUBJECT.to_string()
    } else {
        cleaned.to_string()
    }
}
