//! Derivation of the selected field list
//!
//! The selection model only stores field ids and user-chosen names. The full
//! [`SelectedField`] list is recomputed from those and the current catalog on demand.

use crate::models::{FieldDescriptor, SelectedField};
use std::collections::HashMap;

/// Resolve ordered field ids against an entity's catalog fields.
///
/// Ids the catalog no longer knows are dropped. Fields with an entry in
/// `display_names` keep it; the rest get the catalog label.
pub fn derive_selected_fields(
    entity_id: &str,
    field_ids: &[String],
    catalog_fields: &[FieldDescriptor],
    display_names: &HashMap<String, String>,
) -> Vec<SelectedField> {
    field_ids
        .iter()
        .filter_map(|id| catalog_fields.iter().find(|f| &f.id == id))
        .map(|field| {
            let display_name = display_names
                .get(&field.id)
                .cloned()
                .unwrap_or_else(|| field.label.clone());
            SelectedField {
                field: field.clone(),
                display_name,
                entity_id: entity_id.to_string(),
            }
        })
        .collect()
}
