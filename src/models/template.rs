//! Saved export templates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One column of a saved template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateColumn {
    /// Field id
    pub id: String,
    /// Output label chosen by the user
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

impl TemplateColumn {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            entity_id: None,
        }
    }
}

/// Named snapshot of the column selection for one entity.
///
/// Serialized with camelCase keys; the persisted form is a JSON array of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportTemplate {
    pub id: String,
    pub name: String,
    pub entity_id: String,
    pub columns: Vec<TemplateColumn>,
    pub created_at: DateTime<Utc>,
}
