//! JSON writer
//!
//! A pretty-printed array of objects. Keys follow column order; values keep their
//! JSON types, with dates as ISO 8601 strings and missing cells as `null`.

use crate::export::{ExportError, LabeledTable};
use serde_json::{Map, Value};

pub fn write_json(table: &LabeledTable) -> Result<Vec<u8>, ExportError> {
    let rows: Vec<Value> = (0..table.rows.len())
        .map(|index| {
            let object: Map<String, Value> = table
                .row_pairs(index)
                .map(|(label, value)| (label.to_string(), value.to_json()))
                .collect();
            Value::Object(object)
        })
        .collect();

    serde_json::to_vec_pretty(&Value::Array(rows))
        .map_err(|e| ExportError::Serialization(format!("Failed to serialize JSON: {}", e)))
}
