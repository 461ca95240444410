//! Field catalog
//!
//! Maps entity ids to their ordered field descriptors. The pipeline only needs the
//! read operations of [`FieldCatalog`]; where the metadata comes from (a static table
//! or a remote metadata service) is up to the implementation.

#[cfg(feature = "api-backend")]
pub mod api;
mod builtin;

use crate::models::{EntityDescriptor, FieldDescriptor};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[cfg(feature = "api-backend")]
pub use api::ApiCatalogClient;

/// Error type for catalog lookups
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Entity not found: {0}")]
    EntityNotFound(String),
    #[error("Field {field_id} not found in entity {entity_id}")]
    FieldNotFound { entity_id: String, field_id: String },
    #[error("Invalid catalog: {0}")]
    Invalid(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Read access to entity and field metadata
pub trait FieldCatalog {
    /// All entities, in display order
    fn entities(&self) -> &[EntityDescriptor];

    /// Fields of an entity in catalog order. Unknown entities yield an empty slice.
    fn fields(&self, entity_id: &str) -> &[FieldDescriptor];

    fn entity(&self, entity_id: &str) -> Option<&EntityDescriptor> {
        self.entities().iter().find(|e| e.id == entity_id)
    }

    fn field(&self, entity_id: &str, field_id: &str) -> Option<&FieldDescriptor> {
        self.fields(entity_id).iter().find(|f| f.id == field_id)
    }

    fn require_entity(&self, entity_id: &str) -> Result<&EntityDescriptor, CatalogError> {
        self.entity(entity_id)
            .ok_or_else(|| CatalogError::EntityNotFound(entity_id.to_string()))
    }

    fn require_field(
        &self,
        entity_id: &str,
        field_id: &str,
    ) -> Result<&FieldDescriptor, CatalogError> {
        self.field(entity_id, field_id)
            .ok_or_else(|| CatalogError::FieldNotFound {
                entity_id: entity_id.to_string(),
                field_id: field_id.to_string(),
            })
    }

    /// Fields whose label or description contains `term` (case-insensitive).
    /// A blank term returns every field.
    fn search_fields(&self, entity_id: &str, term: &str) -> Vec<&FieldDescriptor> {
        self.fields(entity_id)
            .iter()
            .filter(|f| f.matches(term))
            .collect()
    }
}

/// In-process catalog backed by plain vectors
#[derive(Debug, Clone, Default)]
pub struct StaticFieldCatalog {
    entities: Vec<EntityDescriptor>,
    fields: HashMap<String, Vec<FieldDescriptor>>,
}

impl StaticFieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entities and fields that ship with the SDK
    pub fn builtin() -> Self {
        builtin::catalog()
    }

    /// Add an entity with its fields, replacing any entity with the same id.
    ///
    /// # Example
    ///
    /// ```rust
    /// use custom_export_sdk::catalog::{FieldCatalog, StaticFieldCatalog};
    /// use custom_export_sdk::models::{EntityDescriptor, FieldDescriptor, FieldType};
    ///
    /// let catalog = StaticFieldCatalog::new().with_entity(
    ///     EntityDescriptor::new("staff", "Staff", ""),
    ///     vec![FieldDescriptor::new("first_name", "first_name", FieldType::String)],
    /// );
    /// assert_eq!(catalog.fields("staff").len(), 1);
    /// ```
    pub fn with_entity(mut self, entity: EntityDescriptor, fields: Vec<FieldDescriptor>) -> Self {
        self.insert_entity(entity, fields);
        self
    }

    pub fn insert_entity(&mut self, entity: EntityDescriptor, fields: Vec<FieldDescriptor>) {
        self.fields.insert(entity.id.clone(), fields);
        match self.entities.iter_mut().find(|e| e.id == entity.id) {
            Some(existing) => *existing = entity,
            None => self.entities.push(entity),
        }
    }

    /// Drop a field from an entity. Returns the removed descriptor, if any.
    pub fn remove_field(&mut self, entity_id: &str, field_id: &str) -> Option<FieldDescriptor> {
        let fields = self.fields.get_mut(entity_id)?;
        let idx = fields.iter().position(|f| f.id == field_id)?;
        debug!("Removing field {} from entity {}", field_id, entity_id);
        Some(fields.remove(idx))
    }

    /// Check ids are non-empty and unique within their scope
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut entity_ids = HashSet::new();
        for entity in &self.entities {
            if entity.id.trim().is_empty() {
                return Err(CatalogError::Invalid("entity with empty id".to_string()));
            }
            if !entity_ids.insert(entity.id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate entity id {}",
                    entity.id
                )));
            }
            let mut field_ids = HashSet::new();
            for field in self.fields(&entity.id) {
                if field.id.trim().is_empty() {
                    return Err(CatalogError::Invalid(format!(
                        "entity {} has a field with an empty id",
                        entity.id
                    )));
                }
                if !field_ids.insert(field.id.as_str()) {
                    return Err(CatalogError::Invalid(format!(
                        "duplicate field id {} in entity {}",
                        field.id, entity.id
                    )));
                }
            }
        }
        Ok(())
    }
}

impl FieldCatalog for StaticFieldCatalog {
    fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    fn fields(&self, entity_id: &str) -> &[FieldDescriptor] {
        match self.fields.get(entity_id) {
            Some(fields) => fields.as_slice(),
            None => {
                debug!("No fields for unknown entity {}", entity_id);
                &[]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;

    fn staff_catalog() -> StaticFieldCatalog {
        StaticFieldCatalog::new().with_entity(
            EntityDescriptor::new("staff", "Staff", "Personnel"),
            vec![
                FieldDescriptor::new("employee_id", "employee_id", FieldType::String),
                FieldDescriptor::new("position", "position", FieldType::String)
                    .with_description("Job title"),
            ],
        )
    }

    #[test]
    fn test_unknown_entity_falls_back_to_empty() {
        let catalog = staff_catalog();
        assert!(catalog.fields("nope").is_empty());
        assert!(catalog.field("nope", "employee_id").is_none());
        assert!(matches!(
            catalog.require_entity("nope"),
            Err(CatalogError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_require_field() {
        let catalog = staff_catalog();
        assert!(catalog.require_field("staff", "position").is_ok());
        assert!(matches!(
            catalog.require_field("staff", "salary"),
            Err(CatalogError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_search_fields() {
        let catalog = staff_catalog();
        let hits = catalog.search_fields("staff", "job");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "position");
        assert_eq!(catalog.search_fields("staff", "").len(), 2);
    }

    #[test]
    fn test_remove_field() {
        let mut catalog = staff_catalog();
        assert!(catalog.remove_field("staff", "position").is_some());
        assert!(catalog.remove_field("staff", "position").is_none());
        assert_eq!(catalog.fields("staff").len(), 1);
    }

    #[test]
    fn test_validate_rejects_duplicate_field_ids() {
        let catalog = StaticFieldCatalog::new().with_entity(
            EntityDescriptor::new("staff", "Staff", ""),
            vec![
                FieldDescriptor::new("id", "id", FieldType::String),
                FieldDescriptor::new("id", "id again", FieldType::String),
            ],
        );
        assert!(matches!(catalog.validate(), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn test_insert_entity_replaces_existing() {
        let mut catalog = staff_catalog();
        catalog.insert_entity(EntityDescriptor::new("staff", "People", ""), vec![]);
        assert_eq!(catalog.entities().len(), 1);
        assert_eq!(catalog.entities()[0].name, "People");
        assert!(catalog.fields("staff").is_empty());
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = StaticFieldCatalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.entities().len(), 5);
        let staff: Vec<&str> = catalog
            .fields("staff")
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(
            &staff[..4],
            &["employee_id", "first_name", "last_name", "position"]
        );
    }
}
