//! Preview data and row sources
//!
//! [`RowSource`] is the contract every export data provider fulfils: given an
//! entity and the fields wanted, return rows keyed by field id. The synthetic
//! [`PreviewGenerator`] sits behind the same contract so a demo can export
//! generated data, but it is never substituted for a real source implicitly.

mod generator;

pub use generator::{MAX_PREVIEW_ROWS, MIN_PREVIEW_ROWS, PreviewConfig, PreviewGenerator};

use crate::models::{FieldDescriptor, FieldValue, Row};
use crate::storage::{StorageBackend, StorageError};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Error type for row sources
#[derive(Debug, thiserror::Error)]
pub enum RowSourceError {
    #[error("No data available for entity {0}")]
    NoData(String),
    #[error("Malformed data for entity {entity_id}: {message}")]
    Malformed { entity_id: String, message: String },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Provider of entity rows
#[async_trait(?Send)]
pub trait RowSource {
    /// Rows of `entity_id` restricted to `fields`, at most `limit` of them
    async fn fetch_rows(
        &self,
        entity_id: &str,
        fields: &[FieldDescriptor],
        limit: usize,
    ) -> Result<Vec<Row>, RowSourceError>;
}

/// Row source producing synthetic rows
#[derive(Debug, Clone)]
pub struct SyntheticRowSource {
    generator: PreviewGenerator,
    rows: usize,
}

impl SyntheticRowSource {
    /// Generate `rows` rows per entity
    pub fn new(generator: PreviewGenerator, rows: usize) -> Self {
        Self { generator, rows }
    }
}

#[async_trait(?Send)]
impl RowSource for SyntheticRowSource {
    async fn fetch_rows(
        &self,
        _entity_id: &str,
        fields: &[FieldDescriptor],
        limit: usize,
    ) -> Result<Vec<Row>, RowSourceError> {
        Ok(self.generator.generate(fields, self.rows.min(limit)))
    }
}

/// Row source reading a JSON array of objects stored under `{entity}-data.json`
pub struct StorageRowSource<B: StorageBackend> {
    storage: B,
}

impl<B: StorageBackend> StorageRowSource<B> {
    pub fn new(storage: B) -> Self {
        Self { storage }
    }

    pub fn data_key(entity_id: &str) -> String {
        format!("{}-data.json", entity_id)
    }
}

#[async_trait(?Send)]
impl<B: StorageBackend> RowSource for StorageRowSource<B> {
    async fn fetch_rows(
        &self,
        entity_id: &str,
        fields: &[FieldDescriptor],
        limit: usize,
    ) -> Result<Vec<Row>, RowSourceError> {
        let key = Self::data_key(entity_id);
        let raw = self
            .storage
            .read(&key)
            .await?
            .ok_or_else(|| RowSourceError::NoData(entity_id.to_string()))?;
        let rows = rows_from_json(entity_id, &raw, fields, limit)?;
        debug!("Read {} rows for {} from {}", rows.len(), entity_id, key);
        Ok(rows)
    }
}

/// Parse a JSON array of objects into typed rows.
///
/// Only `fields` are kept and each value is coerced to its declared type. Fields
/// absent from an object become [`FieldValue::Null`].
pub fn rows_from_json(
    entity_id: &str,
    raw: &str,
    fields: &[FieldDescriptor],
    limit: usize,
) -> Result<Vec<Row>, RowSourceError> {
    let malformed = |message: String| RowSourceError::Malformed {
        entity_id: entity_id.to_string(),
        message,
    };

    let parsed: Value = serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;
    let Value::Array(items) = parsed else {
        return Err(malformed("expected a JSON array of objects".to_string()));
    };

    items
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, item)| {
            let Value::Object(mut object) = item else {
                return Err(malformed(format!("item {} is not an object", index)));
            };
            Ok(fields
                .iter()
                .map(|field| {
                    let value = object
                        .remove(&field.id)
                        .map(|raw| FieldValue::coerce(raw, field.field_type))
                        .unwrap_or(FieldValue::Null);
                    (field.id.clone(), value)
                })
                .collect())
        })
        .collect()
}

/// Formatted preview grid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewTable {
    /// Column headers (display names), in output order
    pub headers: Vec<String>,
    /// Display strings, one inner vector per row
    pub rows: Vec<Vec<String>>,
}

impl PreviewTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;
    use crate::storage::MemoryStorageBackend;
    use chrono::NaiveDate;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("employee_id", "employee_id", FieldType::String),
            FieldDescriptor::new("hire_date", "hire_date", FieldType::Date),
        ]
    }

    #[test]
    fn test_rows_from_json_coerces_and_fills_missing() {
        let raw = r#"[{"employee_id": "E1", "hire_date": "2020-02-03", "extra": 1}, {"employee_id": "E2"}]"#;
        let rows = rows_from_json("staff", raw, &fields(), 10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("hire_date"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2020, 2, 3).unwrap()))
        );
        assert!(!rows[0].contains_key("extra"));
        assert_eq!(rows[1].get("hire_date"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_rows_from_json_rejects_non_array() {
        let result = rows_from_json("staff", r#"{"a": 1}"#, &fields(), 10);
        assert!(matches!(result, Err(RowSourceError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_storage_row_source_limit_and_missing_data() {
        let backend = MemoryStorageBackend::with_entries([(
            "staff-data.json",
            r#"[{"employee_id": "E1"}, {"employee_id": "E2"}, {"employee_id": "E3"}]"#,
        )]);
        let source = StorageRowSource::new(backend);
        let rows = source.fetch_rows("staff", &fields(), 2).await.unwrap();
        assert_eq!(rows.len(), 2);

        let missing = source.fetch_rows("billing", &fields(), 2).await;
        assert!(matches!(missing, Err(RowSourceError::NoData(_))));
    }

    #[tokio::test]
    async fn test_synthetic_source_respects_limit() {
        let source = SyntheticRowSource::new(PreviewGenerator::default(), 50);
        let rows = source.fetch_rows("staff", &fields(), 20).await.unwrap();
        assert_eq!(rows.len(), 20);
    }
}
