//! Entity and field metadata

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical record collection that can be exported
///
/// # Example
///
/// ```rust
/// use custom_export_sdk::models::EntityDescriptor;
///
/// let staff = EntityDescriptor::new("staff", "Staff", "Personnel and employee information");
/// assert_eq!(staff.id, "staff");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Stable identifier, also used as the export file subject
    pub id: String,
    /// Human readable name
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl EntityDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Declared value type of a field
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    /// Numeric values. Metadata services also spell this `number`.
    #[serde(alias = "number")]
    Int,
    Date,
    Datetime,
    Boolean,
    Object,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field of an entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field id, used as the lookup key into row data
    pub id: String,
    /// Default display label
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: String,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            description: String::new(),
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Case-insensitive match on label or description
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.label.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

/// A field chosen for export, with the name it will carry in the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedField {
    pub field: FieldDescriptor,
    /// Output label, defaults to `field.label`
    pub display_name: String,
    pub entity_id: String,
}

impl SelectedField {
    pub fn new(entity_id: impl Into<String>, field: FieldDescriptor) -> Self {
        let display_name = field.label.clone();
        Self {
            field,
            display_name,
            entity_id: entity_id.into(),
        }
    }
}
