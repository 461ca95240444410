//! Export session
//!
//! One user's editing session: pick fields, rename and reorder them, preview the
//! result, save or apply templates and finally export. The session owns its
//! [`SelectionModel`] and borrows the catalog; nothing here is global.

use crate::catalog::{CatalogError, FieldCatalog};
use crate::config::SdkConfig;
use crate::export::{
    CancellationFlag, ExportArtifact, ExportColumn, ExportError, ExportFormat, ExportRequest,
    ExportSubject, Exporter, validate_columns,
};
use crate::format::ValueFormatter;
use crate::models::{ExportTemplate, FieldValue, SelectedField, TemplateColumn, merge_by_index};
use crate::preview::{PreviewGenerator, PreviewTable, RowSource, RowSourceError};
use crate::selection::{MoveDirection, SelectionError, SelectionModel};
use crate::storage::StorageBackend;
use crate::templates::{TemplateError, TemplateStore, load_template};
use tracing::debug;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    RowSource(#[from] RowSourceError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Nothing selected")]
    EmptySelection,
}

pub struct ExportSession<'a, C: FieldCatalog + ?Sized> {
    catalog: &'a C,
    selection: SelectionModel,
    generator: PreviewGenerator,
    formatter: ValueFormatter,
    exporter: Exporter,
}

impl<'a, C: FieldCatalog + ?Sized> ExportSession<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self::with_config(catalog, &SdkConfig::default())
    }

    pub fn with_config(catalog: &'a C, config: &SdkConfig) -> Self {
        Self {
            catalog,
            selection: SelectionModel::new(),
            generator: PreviewGenerator::new(config.preview.clone()),
            formatter: ValueFormatter::new(config.display.clone()),
            exporter: Exporter::new(config.export.clone()),
        }
    }

    pub fn catalog(&self) -> &C {
        self.catalog
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    /// Include or exclude a field. Only fields known to the catalog can be included.
    pub fn select_field(
        &mut self,
        entity_id: &str,
        field_id: &str,
        included: bool,
    ) -> Result<bool, SessionError> {
        if included {
            self.catalog.require_field(entity_id, field_id)?;
        }
        Ok(self.selection.select_field(entity_id, field_id, included))
    }

    pub fn remove_field(&mut self, entity_id: &str, field_id: &str) -> bool {
        self.selection.remove_field(entity_id, field_id)
    }

    pub fn move_field(&mut self, entity_id: &str, field_id: &str, direction: MoveDirection) -> bool {
        self.selection.move_field(entity_id, field_id, direction)
    }

    pub fn rename_field(
        &mut self,
        entity_id: &str,
        field_id: &str,
        new_name: &str,
    ) -> Result<(), SessionError> {
        Ok(self.selection.rename_field(entity_id, field_id, new_name)?)
    }

    /// Select every field of an entity matching `search` (all fields when `None`),
    /// or clear the entity when `included` is false
    pub fn select_all(
        &mut self,
        entity_id: &str,
        included: bool,
        search: Option<&str>,
    ) -> Result<(), SessionError> {
        let catalog = self.catalog;
        catalog.require_entity(entity_id)?;
        let visible = catalog.search_fields(entity_id, search.unwrap_or(""));
        self.selection.select_all(entity_id, included, visible);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.selection.clear();
    }

    /// Current selection in output order
    pub fn selected_fields(&self) -> Vec<SelectedField> {
        self.selection.selected_fields(self.catalog)
    }

    pub fn columns(&self) -> Vec<ExportColumn> {
        self.selected_fields().iter().map(ExportColumn::from).collect()
    }

    /// What an export would be named after; `None` while nothing is selected
    pub fn subject(&self) -> Option<ExportSubject> {
        let mut entities = self.selection.entity_ids();
        let first = entities.next()?;
        if entities.next().is_some() {
            Some(ExportSubject::Combined)
        } else {
            Some(ExportSubject::Entity(first.to_string()))
        }
    }

    /// Synthetic preview of the current selection, formatted for display
    pub fn preview(&self) -> PreviewTable {
        let selected = self.selected_fields();
        let per_entity = self
            .selection
            .entity_ids()
            .map(|entity_id| {
                let fields: Vec<_> = selected
                    .iter()
                    .filter(|s| s.entity_id == entity_id)
                    .map(|s| s.field.clone())
                    .collect();
                (entity_id.to_string(), self.generator.generate_preview(&fields))
            })
            .collect();
        let records = merge_by_index(per_entity);

        let null = FieldValue::Null;
        PreviewTable {
            headers: selected.iter().map(|s| s.display_name.clone()).collect(),
            rows: records
                .iter()
                .map(|record| {
                    selected
                        .iter()
                        .map(|s| {
                            let value = record
                                .get(Some(&s.entity_id), &s.field.id)
                                .unwrap_or(&null);
                            self.formatter.format(value, s.field.field_type)
                        })
                        .collect()
                })
                .collect(),
        }
    }

    /// Save the current selection under `name`, one template per selected entity
    pub async fn save_template<B: StorageBackend>(
        &self,
        store: &mut TemplateStore<B>,
        name: &str,
    ) -> Result<Vec<ExportTemplate>, SessionError> {
        if self.selection.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        let selected = self.selected_fields();
        let mut saved = Vec::new();
        for entity_id in self.selection.entity_ids() {
            let columns = selected
                .iter()
                .filter(|s| s.entity_id == entity_id)
                .map(|s| TemplateColumn::new(&s.field.id, &s.display_name))
                .collect();
            saved.push(store.save(name, entity_id, columns).await?);
        }
        Ok(saved)
    }

    /// Replace the selection of the template's entity with its columns.
    ///
    /// Columns whose field left the catalog are skipped. Returns the fields applied.
    pub fn apply_template(&mut self, template: &ExportTemplate) -> Vec<SelectedField> {
        let resolved = load_template(template, self.catalog);

        let mut entity_ids = vec![template.entity_id.as_str()];
        for field in &resolved {
            if !entity_ids.contains(&field.entity_id.as_str()) {
                entity_ids.push(&field.entity_id);
            }
        }
        for entity_id in entity_ids {
            let fields: Vec<SelectedField> = resolved
                .iter()
                .filter(|f| f.entity_id == entity_id)
                .cloned()
                .collect();
            self.selection.replace_entity(entity_id, &fields);
        }

        debug!(
            "Applied template {} with {} of {} columns",
            template.id,
            resolved.len(),
            template.columns.len()
        );
        resolved
    }

    /// Look a template up in `store` and apply it
    pub fn apply_template_by_id<B: StorageBackend>(
        &mut self,
        store: &TemplateStore<B>,
        template_id: &str,
    ) -> Result<Vec<SelectedField>, SessionError> {
        let template = store
            .get(template_id)
            .ok_or_else(|| SessionError::TemplateNotFound(template_id.to_string()))?
            .clone();
        Ok(self.apply_template(&template))
    }

    /// Fetch rows for every selected entity, merge them and export
    pub async fn export<S: RowSource + ?Sized>(
        &self,
        source: &S,
        format: ExportFormat,
        cancel: &CancellationFlag,
    ) -> Result<ExportArtifact, SessionError> {
        let selected = self.selected_fields();
        let columns: Vec<ExportColumn> = selected.iter().map(ExportColumn::from).collect();
        validate_columns(&columns)?;
        let subject = self.subject().ok_or(SessionError::EmptySelection)?;

        let limit = self.exporter.config().max_rows;
        let mut per_entity = Vec::new();
        for entity_id in self.selection.entity_ids() {
            if cancel.is_cancelled() {
                return Err(ExportError::Cancelled.into());
            }
            let fields: Vec<_> = selected
                .iter()
                .filter(|s| s.entity_id == entity_id)
                .map(|s| s.field.clone())
                .collect();
            // One extra row so the exporter can tell that data was cut off
            let rows = source.fetch_rows(entity_id, &fields, limit.saturating_add(1)).await?;
            debug!("Fetched {} rows for {}", rows.len(), entity_id);
            per_entity.push((entity_id.to_string(), rows));
        }
        let records = merge_by_index(per_entity);

        let request = ExportRequest {
            subject,
            columns,
            format,
        };
        Ok(self
            .exporter
            .export_with_cancellation(&request, &records, cancel)?)
    }

    /// [`export`](Self::export) with the format given by name
    pub async fn export_as<S: RowSource + ?Sized>(
        &self,
        source: &S,
        format: &str,
        cancel: &CancellationFlag,
    ) -> Result<ExportArtifact, SessionError> {
        let format: ExportFormat = format.parse()?;
        self.export(source, format, cancel).await
    }
}
