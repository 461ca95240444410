//! Rows and merged records
//!
//! A [`Row`] belongs to one entity and is keyed by bare field id. A [`Record`] is what
//! the serializer consumes: values are keyed by `(entity, field)` so that two entities
//! sharing a field id never overwrite each other when their rows are merged.

use super::value::FieldValue;
use std::collections::HashMap;

/// One entity row, keyed by field id
pub type Row = HashMap<String, FieldValue>;

/// Key of a value inside a [`Record`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    /// Originating entity, `None` for rows that were never namespaced
    pub entity_id: Option<String>,
    pub field_id: String,
}

impl FieldKey {
    pub fn new(entity_id: Option<&str>, field_id: &str) -> Self {
        Self {
            entity_id: entity_id.map(str::to_string),
            field_id: field_id.to_string(),
        }
    }
}

/// A logical export row, possibly combining values from several entities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<FieldKey, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a row of one entity, namespacing its keys
    pub fn from_entity_row(entity_id: &str, row: Row) -> Self {
        let mut record = Self::new();
        record.extend_entity_row(entity_id, row);
        record
    }

    fn extend_entity_row(&mut self, entity_id: &str, row: Row) {
        for (field_id, value) in row {
            self.values
                .insert(FieldKey::new(Some(entity_id), &field_id), value);
        }
    }

    pub fn insert(&mut self, key: FieldKey, value: FieldValue) {
        self.values.insert(key, value);
    }

    /// Look up a value. An `(entity, field)` match wins, then the bare field id.
    pub fn get(&self, entity_id: Option<&str>, field_id: &str) -> Option<&FieldValue> {
        if let Some(entity_id) = entity_id
            && let Some(value) = self.values.get(&FieldKey::new(Some(entity_id), field_id))
        {
            return Some(value);
        }
        self.values.get(&FieldKey::new(None, field_id))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows that were never namespaced, for example a single-entity dataset
impl From<Row> for Record {
    fn from(row: Row) -> Self {
        let values = row
            .into_iter()
            .map(|(field_id, value)| (FieldKey::new(None, &field_id), value))
            .collect();
        Self { values }
    }
}

/// Combine per-entity row lists into records by position.
///
/// Record `i` holds row `i` of every entity. Entities with fewer rows simply
/// contribute nothing to the trailing records.
pub fn merge_by_index(per_entity: Vec<(String, Vec<Row>)>) -> Vec<Record> {
    let len = per_entity
        .iter()
        .map(|(_, rows)| rows.len())
        .max()
        .unwrap_or(0);
    let mut records = vec![Record::new(); len];
    for (entity_id, rows) in per_entity {
        for (record, row) in records.iter_mut().zip(rows) {
            record.extend_entity_row(&entity_id, row);
        }
    }
    records
}
