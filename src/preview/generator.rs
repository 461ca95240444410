//! Synthetic preview rows
//!
//! Values are derived from the row index only, so the same fields and count always
//! produce the same rows. Nothing here is real data.

use crate::models::{FieldDescriptor, FieldType, FieldValue, Row};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Smallest and largest preview sizes
pub const MIN_PREVIEW_ROWS: usize = 1;
pub const MAX_PREVIEW_ROWS: usize = 50;

/// Generated dates step back through this many rows, then start over
const DATE_CYCLE: i64 = 520;

/// Preview configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Rows shown in the on-screen preview
    pub row_count: usize,
    /// Dates count backwards from this day
    pub reference_date: NaiveDate,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            row_count: 10,
            reference_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }
}

impl PreviewConfig {
    /// Row count clamped to the supported preview range
    pub fn effective_row_count(&self) -> usize {
        self.row_count.clamp(MIN_PREVIEW_ROWS, MAX_PREVIEW_ROWS)
    }
}

/// Generates illustrative rows for the preview table
#[derive(Debug, Clone, Default)]
pub struct PreviewGenerator {
    config: PreviewConfig,
}

impl PreviewGenerator {
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Produce `count` rows with a value for every field
    pub fn generate(&self, fields: &[FieldDescriptor], count: usize) -> Vec<Row> {
        (0..count)
            .map(|index| {
                fields
                    .iter()
                    .map(|field| (field.id.clone(), self.value_for(field, index)))
                    .collect()
            })
            .collect()
    }

    /// Produce the configured number of preview rows
    pub fn generate_preview(&self, fields: &[FieldDescriptor]) -> Vec<Row> {
        self.generate(fields, self.config.effective_row_count())
    }

    fn value_for(&self, field: &FieldDescriptor, index: usize) -> FieldValue {
        let step = i64::try_from(index).unwrap_or(i64::MAX);
        let reference = self.config.reference_date;
        match field.field_type {
            FieldType::Date => FieldValue::Date(
                reference
                    .checked_sub_signed(Duration::days((step % DATE_CYCLE) * 7))
                    .unwrap_or(reference),
            ),
            FieldType::Datetime => {
                let start = reference.and_hms_opt(9, 0, 0).unwrap_or_default().and_utc();
                FieldValue::DateTime(
                    start
                        .checked_sub_signed(Duration::hours((step % DATE_CYCLE) * 5))
                        .unwrap_or(start),
                )
            }
            FieldType::Int => FieldValue::Int((((step % 1000) * 37 + 11) % 1000) + 1),
            FieldType::Boolean => FieldValue::Bool(index % 2 == 0),
            FieldType::Object => FieldValue::Object(json!({
                "field": field.id,
                "row": index + 1,
            })),
            FieldType::String => FieldValue::Text(format!("{} {}", field.id, index + 1)),
        }
    }
}
