//! SDK configuration
//!
//! Every setting has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! [export]
//! max_rows = 5000
//! combined_subject = "report"
//!
//! [export.pdf]
//! page_size = "letter"
//! orientation = "portrait"
//! footer = "Confidential"
//!
//! [preview]
//! row_count = 20
//!
//! [templates]
//! storage_key = "export-templates"
//!
//! [display]
//! date_format = "%d.%m.%Y"
//! ```

use crate::export::{ExportConfig, PdfOptions};
use crate::format::DisplayConfig;
use crate::preview::{MAX_PREVIEW_ROWS, PreviewConfig};
use crate::templates::TemplateConfig;
use anyhow::{Context, Result, ensure};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    pub export: ExportConfig,
    pub preview: PreviewConfig,
    pub templates: TemplateConfig,
    pub display: DisplayConfig,
}

impl SdkConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SdkConfig = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.export.max_rows > 0, "export.max_rows must be greater than 0");
        ensure!(
            !self.export.combined_subject.trim().is_empty(),
            "export.combined_subject cannot be empty"
        );
        ensure!(
            (4..=72).contains(&self.export.pdf.font_size),
            "export.pdf.font_size must be between 4 and 72, got {}",
            self.export.pdf.font_size
        );
        ensure!(
            self.preview.row_count <= MAX_PREVIEW_ROWS,
            "preview.row_count must be at most {}, got {}",
            MAX_PREVIEW_ROWS,
            self.preview.row_count
        );
        ensure!(
            (1..=9999).contains(&self.preview.reference_date.year()),
            "preview.reference_date must fall between years 1 and 9999, got {}",
            self.preview.reference_date
        );
        ensure!(
            !self.templates.storage_key.trim().is_empty(),
            "templates.storage_key cannot be empty"
        );
        ensure!(
            !self.display.date_format.is_empty() && !self.display.datetime_format.is_empty(),
            "display formats cannot be empty"
        );
        Ok(())
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.export.max_rows = max_rows;
        self
    }

    pub fn with_combined_subject(mut self, subject: impl Into<String>) -> Self {
        self.export.combined_subject = subject.into();
        self
    }

    pub fn with_pdf(mut self, pdf: PdfOptions) -> Self {
        self.export.pdf = pdf;
        self
    }

    pub fn with_preview_rows(mut self, row_count: usize) -> Self {
        self.preview.row_count = row_count;
        self
    }

    pub fn with_template_key(mut self, key: impl Into<String>) -> Self {
        self.templates.storage_key = key.into();
        self
    }

    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }
}
