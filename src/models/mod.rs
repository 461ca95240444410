//! Models module for the SDK
//!
//! Defines the data structures shared by the export pipeline: entity and field
//! metadata, typed cell values, rows and saved templates.

pub mod entity;
pub mod row;
pub mod template;
pub mod value;

pub use entity::{EntityDescriptor, FieldDescriptor, FieldType, SelectedField};
pub use row::{FieldKey, Record, Row, merge_by_index};
pub use template::{ExportTemplate, TemplateColumn};
pub use value::FieldValue;
