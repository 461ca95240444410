//! Selection model
//!
//! Tracks, per entity, which fields the user picked, in which order, and under which
//! output name. Entities keep the order in which they were first selected, which
//! together with the per-entity field order gives the column order of a combined
//! multi-entity export.

mod derive;

pub use derive::derive_selected_fields;

use crate::catalog::FieldCatalog;
use crate::models::{FieldDescriptor, SelectedField};
use std::collections::HashMap;

/// Direction for [`SelectionModel::move_field`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Error type for selection edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Display name cannot be blank")]
    BlankDisplayName,
    #[error("Field {field_id} is not selected for entity {entity_id}")]
    NotSelected { entity_id: String, field_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EntitySelection {
    entity_id: String,
    field_ids: Vec<String>,
    /// Only names the user changed; everything else uses the catalog label
    display_names: HashMap<String, String>,
}

impl EntitySelection {
    fn new(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            field_ids: Vec::new(),
            display_names: HashMap::new(),
        }
    }

    fn position(&self, field_id: &str) -> Option<usize> {
        self.field_ids.iter().position(|id| id == field_id)
    }
}

/// In-memory selection state of one editing session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    entities: Vec<EntitySelection>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, entity_id: &str) -> Option<&EntitySelection> {
        self.entities.iter().find(|e| e.entity_id == entity_id)
    }

    fn entry_mut(&mut self, entity_id: &str) -> Option<&mut EntitySelection> {
        self.entities.iter_mut().find(|e| e.entity_id == entity_id)
    }

    fn entry_or_insert(&mut self, entity_id: &str) -> &mut EntitySelection {
        let idx = match self.entities.iter().position(|e| e.entity_id == entity_id) {
            Some(idx) => idx,
            None => {
                self.entities.push(EntitySelection::new(entity_id));
                self.entities.len() - 1
            }
        };
        &mut self.entities[idx]
    }

    /// Entities with no selected field are forgotten entirely
    fn prune(&mut self) {
        self.entities.retain(|e| !e.field_ids.is_empty());
    }

    /// Include or exclude a field. Returns `false` when it already was in that state.
    pub fn select_field(&mut self, entity_id: &str, field_id: &str, included: bool) -> bool {
        if included {
            let entry = self.entry_or_insert(entity_id);
            if entry.position(field_id).is_some() {
                return false;
            }
            entry.field_ids.push(field_id.to_string());
            true
        } else {
            let Some(entry) = self.entry_mut(entity_id) else {
                return false;
            };
            let Some(idx) = entry.position(field_id) else {
                return false;
            };
            entry.field_ids.remove(idx);
            entry.display_names.remove(field_id);
            self.prune();
            true
        }
    }

    pub fn remove_field(&mut self, entity_id: &str, field_id: &str) -> bool {
        self.select_field(entity_id, field_id, false)
    }

    /// Swap a field with its neighbour. No-op (returns `false`) at either end or
    /// when the field is not selected.
    pub fn move_field(&mut self, entity_id: &str, field_id: &str, direction: MoveDirection) -> bool {
        let Some(entry) = self.entry_mut(entity_id) else {
            return false;
        };
        let Some(idx) = entry.position(field_id) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Up if idx > 0 => idx - 1,
            MoveDirection::Down if idx + 1 < entry.field_ids.len() => idx + 1,
            _ => return false,
        };
        entry.field_ids.swap(idx, target);
        true
    }

    /// Set the output name of a selected field. Blank names are rejected and leave
    /// the current name untouched.
    pub fn rename_field(
        &mut self,
        entity_id: &str,
        field_id: &str,
        new_name: &str,
    ) -> Result<(), SelectionError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(SelectionError::BlankDisplayName);
        }
        let entry = self
            .entry_mut(entity_id)
            .filter(|e| e.position(field_id).is_some())
            .ok_or_else(|| SelectionError::NotSelected {
                entity_id: entity_id.to_string(),
                field_id: field_id.to_string(),
            })?;
        entry
            .display_names
            .insert(field_id.to_string(), new_name.to_string());
        Ok(())
    }

    /// Select every field in `visible` (typically the search-filtered list), or clear
    /// the entity's whole selection when `included` is false.
    pub fn select_all<'a, I>(&mut self, entity_id: &str, included: bool, visible: I)
    where
        I: IntoIterator<Item = &'a FieldDescriptor>,
    {
        if !included {
            self.clear_entity(entity_id);
            return;
        }
        for field in visible {
            self.select_field(entity_id, &field.id, true);
        }
    }

    pub fn clear_entity(&mut self, entity_id: &str) {
        self.entities.retain(|e| e.entity_id != entity_id);
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Replace an entity's selection with already resolved fields (e.g. a loaded template)
    pub fn replace_entity(&mut self, entity_id: &str, fields: &[SelectedField]) {
        let entry = self.entry_or_insert(entity_id);
        entry.field_ids.clear();
        entry.display_names.clear();
        for selected in fields {
            if entry.position(&selected.field.id).is_some() {
                continue;
            }
            entry.field_ids.push(selected.field.id.clone());
            if selected.display_name != selected.field.label {
                entry
                    .display_names
                    .insert(selected.field.id.clone(), selected.display_name.clone());
            }
        }
        self.prune();
    }

    pub fn is_selected(&self, entity_id: &str, field_id: &str) -> bool {
        self.entry(entity_id)
            .is_some_and(|e| e.position(field_id).is_some())
    }

    /// Selected field ids of an entity, in output order
    pub fn field_ids(&self, entity_id: &str) -> &[String] {
        self.entry(entity_id)
            .map(|e| e.field_ids.as_slice())
            .unwrap_or_default()
    }

    /// The user-assigned name, if the field was renamed
    pub fn custom_name(&self, entity_id: &str, field_id: &str) -> Option<&str> {
        self.entry(entity_id)
            .and_then(|e| e.display_names.get(field_id))
            .map(String::as_str)
    }

    /// Entities with at least one selected field, in first-selection order
    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.entity_id.as_str())
    }

    pub fn is_multi_entity(&self) -> bool {
        self.entities.len() > 1
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of selected fields across all entities
    pub fn len(&self) -> usize {
        self.entities.iter().map(|e| e.field_ids.len()).sum()
    }

    /// Resolve one entity's selection against the catalog
    pub fn selected_fields_for<C: FieldCatalog + ?Sized>(
        &self,
        catalog: &C,
        entity_id: &str,
    ) -> Vec<SelectedField> {
        match self.entry(entity_id) {
            Some(entry) => derive_selected_fields(
                entity_id,
                &entry.field_ids,
                catalog.fields(entity_id),
                &entry.display_names,
            ),
            None => Vec::new(),
        }
    }

    /// Resolve the whole selection against the catalog, entity by entity
    pub fn selected_fields<C: FieldCatalog + ?Sized>(&self, catalog: &C) -> Vec<SelectedField> {
        self.entities
            .iter()
            .flat_map(|entry| {
                derive_selected_fields(
                    &entry.entity_id,
                    &entry.field_ids,
                    catalog.fields(&entry.entity_id),
                    &entry.display_names,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_idempotent() {
        let mut model = SelectionModel::new();
        assert!(model.select_field("staff", "first_name", true));
        assert!(!model.select_field("staff", "first_name", true));
        assert_eq!(model.field_ids("staff"), &["first_name".to_string()]);
        assert!(!model.select_field("staff", "last_name", false));
    }

    #[test]
    fn test_deselect_forgets_custom_name() {
        let mut model = SelectionModel::new();
        model.select_field("staff", "position", true);
        model.rename_field("staff", "position", "Role").unwrap();
        model.remove_field("staff", "position");
        model.select_field("staff", "position", true);
        assert_eq!(model.custom_name("staff", "position"), None);
    }

    #[test]
    fn test_rename_trims_and_requires_selection() {
        let mut model = SelectionModel::new();
        assert!(matches!(
            model.rename_field("staff", "position", "Role"),
            Err(SelectionError::NotSelected { .. })
        ));
        model.select_field("staff", "position", true);
        model.rename_field("staff", "position", "  Role ").unwrap();
        assert_eq!(model.custom_name("staff", "position"), Some("Role"));
    }

    #[test]
    fn test_move_unknown_field_is_noop() {
        let mut model = SelectionModel::new();
        model.select_field("staff", "a", true);
        assert!(!model.move_field("staff", "b", MoveDirection::Up));
        assert!(!model.move_field("other", "a", MoveDirection::Down));
    }

    #[test]
    fn test_entity_order_is_first_selection_order() {
        let mut model = SelectionModel::new();
        model.select_field("billing", "amount", true);
        model.select_field("staff", "first_name", true);
        model.select_field("billing", "invoice_id", true);
        let ids: Vec<&str> = model.entity_ids().collect();
        assert_eq!(ids, vec!["billing", "staff"]);
        assert!(model.is_multi_entity());
        assert_eq!(model.len(), 3);
    }
}
