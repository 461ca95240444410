//! Template store
//!
//! Persists named column selections through a [`StorageBackend`]. The whole list lives
//! under a single key as a JSON array, newest first.
//!
//! Every mutation re-reads the persisted list, applies the change and writes it back
//! before the cached list is replaced. A failed write therefore leaves both the
//! backend and the cache as they were. Two writers sharing one backend (e.g. two
//! browser tabs) resolve as last-write-wins on the whole list.

use crate::catalog::FieldCatalog;
use crate::models::{ExportTemplate, SelectedField, TemplateColumn};
use crate::storage::{StorageBackend, StorageError};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default storage key for the template list
pub const DEFAULT_TEMPLATE_KEY: &str = "export-templates";

/// Error type for template operations
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
    #[error("Stored templates under {key} are malformed: {message}")]
    Corrupt { key: String, message: String },
}

/// Template store configuration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Key the template list is stored under
    pub storage_key: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_TEMPLATE_KEY.to_string(),
        }
    }
}

/// Saved templates backed by a storage backend
pub struct TemplateStore<B: StorageBackend> {
    storage: B,
    key: String,
    templates: Vec<ExportTemplate>,
}

impl<B: StorageBackend> TemplateStore<B> {
    /// Open the store, reading whatever is persisted under `key`.
    ///
    /// A missing key is an empty store. Malformed data is reported, not discarded.
    pub async fn open(storage: B, key: impl Into<String>) -> Result<Self, TemplateError> {
        let key = key.into();
        let templates = read_templates(&storage, &key).await?;
        debug!("Opened template store {} with {} templates", key, templates.len());
        Ok(Self {
            storage,
            key,
            templates,
        })
    }

    /// Open the store with the key from a [`TemplateConfig`]
    pub async fn with_config(storage: B, config: &TemplateConfig) -> Result<Self, TemplateError> {
        Self::open(storage, config.storage_key.clone()).await
    }

    /// Reload the cached list from storage
    pub async fn refresh(&mut self) -> Result<(), TemplateError> {
        self.templates = read_templates(&self.storage, &self.key).await?;
        Ok(())
    }

    /// Save a new template and return it.
    ///
    /// The name is trimmed and must not be blank; at least one column is required.
    pub async fn save(
        &mut self,
        name: &str,
        entity_id: &str,
        columns: Vec<TemplateColumn>,
    ) -> Result<ExportTemplate, TemplateError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TemplateError::Validation(
                "Template name cannot be empty".to_string(),
            ));
        }
        if columns.is_empty() {
            return Err(TemplateError::Validation(
                "Template must contain at least one column".to_string(),
            ));
        }

        let template = ExportTemplate {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            entity_id: entity_id.to_string(),
            columns,
            created_at: Utc::now(),
        };

        let mut updated = read_templates(&self.storage, &self.key).await?;
        updated.insert(0, template.clone());
        self.persist(updated).await?;

        info!(
            "Saved template '{}' ({}) for entity {}",
            template.name, template.id, template.entity_id
        );
        Ok(template)
    }

    /// Delete a template by id. Returns `false` if no template had that id.
    pub async fn delete(&mut self, id: &str) -> Result<bool, TemplateError> {
        let mut updated = read_templates(&self.storage, &self.key).await?;
        let before = updated.len();
        updated.retain(|t| t.id != id);
        if updated.len() == before {
            self.templates = updated;
            return Ok(false);
        }
        self.persist(updated).await?;

        info!("Deleted template {}", id);
        Ok(true)
    }

    async fn persist(&mut self, templates: Vec<ExportTemplate>) -> Result<(), TemplateError> {
        let json = serde_json::to_string(&templates)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        self.storage.write(&self.key, &json).await?;
        self.templates = templates;
        Ok(())
    }

    /// Templates of one entity, newest first
    pub fn list(&self, entity_id: &str) -> Vec<&ExportTemplate> {
        self.templates
            .iter()
            .filter(|t| t.entity_id == entity_id)
            .collect()
    }

    pub fn all(&self) -> &[ExportTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&ExportTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn storage(&self) -> &B {
        &self.storage
    }
}

/// Resolve a template's columns against the current catalog.
///
/// Columns whose field no longer exists are dropped. A blank stored label falls back
/// to the catalog label.
pub fn load_template<C: FieldCatalog + ?Sized>(
    template: &ExportTemplate,
    catalog: &C,
) -> Vec<SelectedField> {
    let mut selected = Vec::with_capacity(template.columns.len());
    for column in &template.columns {
        let entity_id = column.entity_id.as_deref().unwrap_or(&template.entity_id);
        match catalog.field(entity_id, &column.id) {
            Some(field) => {
                let label = column.label.trim();
                let display_name = if label.is_empty() {
                    field.label.clone()
                } else {
                    label.to_string()
                };
                selected.push(SelectedField {
                    field: field.clone(),
                    display_name,
                    entity_id: entity_id.to_string(),
                });
            }
            None => debug!(
                "Template {} references missing field {}.{}, skipping",
                template.id, entity_id, column.id
            ),
        }
    }
    selected
}

async fn read_templates<B: StorageBackend>(
    storage: &B,
    key: &str,
) -> Result<Vec<ExportTemplate>, TemplateError> {
    let Some(raw) = storage.read(key).await? else {
        return Ok(Vec::new());
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw).map_err(|e| {
        warn!("Stored templates under {} could not be parsed: {}", key, e);
        TemplateError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorageBackend;

    fn columns() -> Vec<TemplateColumn> {
        vec![
            TemplateColumn::new("first_name", "First"),
            TemplateColumn::new("last_name", "Last"),
        ]
    }

    #[tokio::test]
    async fn test_save_prepends_and_trims_name() {
        let mut store = TemplateStore::open(MemoryStorageBackend::new(), DEFAULT_TEMPLATE_KEY)
            .await
            .unwrap();
        store.save("One", "staff", columns()).await.unwrap();
        let second = store.save("  Two  ", "staff", columns()).await.unwrap();

        assert_eq!(second.name, "Two");
        let names: Vec<&str> = store.list("staff").iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Two", "One"]);
    }

    #[tokio::test]
    async fn test_blank_name_rejected_without_write() {
        let mut store = TemplateStore::open(MemoryStorageBackend::new(), DEFAULT_TEMPLATE_KEY)
            .await
            .unwrap();
        let result = store.save("   ", "staff", columns()).await;
        assert!(matches!(result, Err(TemplateError::Validation(_))));
        assert_eq!(store.storage().read(DEFAULT_TEMPLATE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_columns_rejected() {
        let mut store = TemplateStore::open(MemoryStorageBackend::new(), DEFAULT_TEMPLATE_KEY)
            .await
            .unwrap();
        let result = store.save("Empty", "staff", Vec::new()).await;
        assert!(matches!(result, Err(TemplateError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_unknown_is_noop() {
        let mut store = TemplateStore::open(MemoryStorageBackend::new(), DEFAULT_TEMPLATE_KEY)
            .await
            .unwrap();
        let saved = store.save("One", "staff", columns()).await.unwrap();
        assert!(!store.delete("missing").await.unwrap());
        assert!(store.delete(&saved.id).await.unwrap());
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_storage_is_reported() {
        let backend = MemoryStorageBackend::with_entries([(DEFAULT_TEMPLATE_KEY, "{not json")]);
        let result = TemplateStore::open(backend, DEFAULT_TEMPLATE_KEY).await;
        assert!(matches!(result, Err(TemplateError::Corrupt { .. })));
    }
}
