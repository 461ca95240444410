//! Display formatting for preview cells
//!
//! [`ValueFormatter::format`] is total: every value/type combination yields a string.
//! Export files never go through here; writers use the raw value forms.

use crate::models::value::{parse_date, parse_datetime};
use crate::models::{FieldType, FieldValue};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Locale patterns used by the formatter (chrono `strftime` syntax)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub date_format: String,
    pub datetime_format: String,
    pub true_label: String,
    pub false_label: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: "%m/%d/%Y".to_string(),
            datetime_format: "%m/%d/%Y, %I:%M:%S %p".to_string(),
            true_label: "Yes".to_string(),
            false_label: "No".to_string(),
        }
    }
}

/// Formats values for on-screen display
#[derive(Debug, Clone, Default)]
pub struct ValueFormatter {
    config: DisplayConfig,
}

impl ValueFormatter {
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    /// Render `value` according to the field's declared type
    pub fn format(&self, value: &FieldValue, field_type: FieldType) -> String {
        match (value, field_type) {
            (FieldValue::Null, _) => String::new(),
            (FieldValue::Bool(b), _) => self.bool_label(*b).to_string(),
            (FieldValue::Date(d), FieldType::Datetime) => self.datetime(
                &d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
            ),
            (FieldValue::Date(d), _) => self.date(d),
            (FieldValue::DateTime(dt), FieldType::Date) => self.date(&dt.date_naive()),
            (FieldValue::DateTime(dt), _) => self.datetime(dt),
            (FieldValue::Text(s), FieldType::Date) => match parse_date(s) {
                Some(d) => self.date(&d),
                None => s.clone(),
            },
            (FieldValue::Text(s), FieldType::Datetime) => match parse_datetime(s) {
                Some(dt) => self.datetime(&dt),
                None => s.clone(),
            },
            (FieldValue::Int(i), FieldType::Boolean) => self.bool_label(*i != 0).to_string(),
            (FieldValue::Float(f), FieldType::Boolean) => {
                self.bool_label(*f != 0.0 && !f.is_nan()).to_string()
            }
            (FieldValue::Text(s), FieldType::Boolean) => {
                self.bool_label(text_truthiness(s)).to_string()
            }
            (FieldValue::Object(_), FieldType::Boolean) => self.bool_label(true).to_string(),
            (FieldValue::Object(v), _) => v.to_string(),
            (other, _) => other.to_raw_string(),
        }
    }

    fn bool_label(&self, value: bool) -> &str {
        if value {
            &self.config.true_label
        } else {
            &self.config.false_label
        }
    }

    // A bad pattern in user config makes chrono's Display fail; fall back to ISO.
    fn date(&self, date: &NaiveDate) -> String {
        let mut out = String::new();
        if std::fmt::Write::write_fmt(
            &mut out,
            format_args!("{}", date.format(&self.config.date_format)),
        )
        .is_err()
        {
            return date.format("%Y-%m-%d").to_string();
        }
        out
    }

    fn datetime(&self, dt: &DateTime<Utc>) -> String {
        let mut out = String::new();
        if std::fmt::Write::write_fmt(
            &mut out,
            format_args!("{}", dt.format(&self.config.datetime_format)),
        )
        .is_err()
        {
            return FieldValue::DateTime(*dt).to_raw_string();
        }
        out
    }
}

/// Boolean reading of stored text: the usual false words, otherwise non-empty is true
fn text_truthiness(s: &str) -> bool {
    !matches!(
        s.trim().to_lowercase().as_str(),
        "" | "false" | "no" | "0" | "off"
    )
}

/// Format with the default (en-US) display configuration
pub fn format_value(value: &FieldValue, field_type: FieldType) -> String {
    ValueFormatter::default().format(value, field_type)
}
