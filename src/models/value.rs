//! Typed cell values
//!
//! Row data arrives as loosely typed JSON (from a data file, a remote service or the
//! preview generator). [`FieldValue::coerce`] converts it into a tagged value using the
//! field type declared in the catalog, so every writer downstream works on typed data.

use super::entity::FieldType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Object(Value),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert raw JSON into a value of the declared type.
    ///
    /// A string only becomes typed when its typed form writes back to exactly the same
    /// text, so export files carry the fetched value unchanged. Anything else stays
    /// [`FieldValue::Text`]; the formatter still parses it leniently for display.
    pub fn coerce(raw: Value, field_type: FieldType) -> Self {
        match (field_type, raw) {
            (_, Value::Null) => FieldValue::Null,
            (FieldType::Boolean, Value::Bool(b)) => FieldValue::Bool(b),
            (FieldType::Boolean, Value::String(s)) => match s.as_str() {
                "true" => FieldValue::Bool(true),
                "false" => FieldValue::Bool(false),
                _ => FieldValue::Text(s),
            },
            (FieldType::Int, Value::String(s)) => lossless(s, parse_number),
            (FieldType::Date, Value::String(s)) => lossless(s, |s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .map(FieldValue::Date)
            }),
            (FieldType::Datetime, Value::String(s)) => {
                lossless(s, |s| parse_datetime(s).map(FieldValue::DateTime))
            }
            (FieldType::Object, raw @ (Value::Object(_) | Value::Array(_))) => {
                FieldValue::Object(raw)
            }
            (_, raw) => FieldValue::from_json(raw),
        }
    }

    /// Untyped conversion used when no declared type is available
    pub fn from_json(raw: Value) -> Self {
        match raw {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            },
            Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Object(other),
        }
    }

    /// JSON representation used by the JSON writer
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Date(_) | FieldValue::DateTime(_) => Value::String(self.to_raw_string()),
            FieldValue::Object(v) => v.clone(),
        }
    }

    /// Raw textual form written into export files.
    ///
    /// Dates are ISO 8601, datetimes RFC 3339 in UTC, objects compact JSON.
    pub fn to_raw_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            FieldValue::Object(v) => v.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

fn lossless(s: String, parse: impl FnOnce(&str) -> Option<FieldValue>) -> FieldValue {
    match parse(&s) {
        Some(value) if value.to_raw_string() == s => value,
        _ => FieldValue::Text(s),
    }
}

fn parse_number(s: &str) -> Option<FieldValue> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(FieldValue::Int(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(FieldValue::Float)
}

/// Accepts `YYYY-MM-DD` or any datetime form (the date part is kept)
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS` (read as UTC)
/// and bare dates (midnight UTC)
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_by_declared_type() {
        assert_eq!(
            FieldValue::coerce(json!("2024-03-05"), FieldType::Date),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
        assert_eq!(
            FieldValue::coerce(json!("42"), FieldType::Int),
            FieldValue::Int(42)
        );
        assert_eq!(
            FieldValue::coerce(json!("true"), FieldType::Boolean),
            FieldValue::Bool(true)
        );
        assert_eq!(
            FieldValue::coerce(json!({"city": "Berlin"}), FieldType::Object),
            FieldValue::Object(json!({"city": "Berlin"}))
        );
    }

    #[test]
    fn test_coerce_keeps_unparseable_date_as_text() {
        assert_eq!(
            FieldValue::coerce(json!("not a date"), FieldType::Date),
            FieldValue::text("not a date")
        );
    }

    #[test]
    fn test_coerce_keeps_text_that_would_not_write_back_unchanged() {
        for (raw, field_type) in [
            ("2024-05-01T10:00:00Z", FieldType::Date),
            ("2024-5-1", FieldType::Date),
            ("2024-05-01 10:00:00", FieldType::Datetime),
            ("2024-05-01T12:00:00+02:00", FieldType::Datetime),
            ("007", FieldType::Int),
            ("yes", FieldType::Boolean),
        ] {
            assert_eq!(
                FieldValue::coerce(json!(raw), field_type),
                FieldValue::text(raw),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_coerce_datetime_keeps_fractional_seconds() {
        let value = FieldValue::coerce(json!("2024-05-01T10:00:00.123Z"), FieldType::Datetime);
        assert!(matches!(value, FieldValue::DateTime(_)));
        assert_eq!(value.to_raw_string(), "2024-05-01T10:00:00.123Z");
    }

    #[test]
    fn test_datetime_parsing_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
            .and_utc();
        assert_eq!(parse_datetime("2024-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_datetime("2024-01-02T03:04:05"), Some(expected));
        assert_eq!(parse_datetime("2024-01-02 03:04:05"), Some(expected));
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn test_raw_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(FieldValue::Date(date).to_raw_string(), "2024-01-02");
        assert_eq!(
            FieldValue::DateTime(date.and_hms_opt(8, 0, 0).unwrap().and_utc()).to_raw_string(),
            "2024-01-02T08:00:00Z"
        );
        assert_eq!(FieldValue::Bool(false).to_raw_string(), "false");
        assert_eq!(FieldValue::Null.to_raw_string(), "");
        assert_eq!(
            FieldValue::Object(json!({"a": 1})).to_raw_string(),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn test_to_json_non_finite_float_is_null() {
        assert_eq!(FieldValue::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(FieldValue::Float(1.5).to_json(), json!(1.5));
    }
}
