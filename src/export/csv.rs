//! CSV writer
//!
//! Header row of labels, then one record per row. Fields are quoted only when they
//! contain a delimiter, quote or line break; records end in CRLF.

use crate::export::{ExportError, LabeledTable};

pub fn write_csv(table: &LabeledTable) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer
        .write_record(&table.headers)
        .map_err(|e| ExportError::Serialization(format!("Failed to write CSV header: {}", e)))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(|value| value.to_raw_string()))
            .map_err(|e| ExportError::Serialization(format!("Failed to write CSV row: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Serialization(format!("Failed to flush CSV: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use chrono::NaiveDate;

    #[test]
    fn test_header_and_rows() {
        let table = LabeledTable {
            headers: vec!["Name".to_string(), "Hired".to_string(), "Active".to_string()],
            rows: vec![vec![
                FieldValue::text("Ada"),
                FieldValue::Date(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap()),
                FieldValue::Bool(true),
            ]],
        };
        let out = String::from_utf8(write_csv(&table).unwrap()).unwrap();
        assert_eq!(out, "Name,Hired,Active\r\nAda,2020-01-31,true\r\n");
    }

    #[test]
    fn test_quoting_and_nulls() {
        let table = LabeledTable {
            headers: vec!["Note, long".to_string(), "Empty".to_string()],
            rows: vec![vec![FieldValue::text("say \"hi\"\nbye"), FieldValue::Null]],
        };
        let out = String::from_utf8(write_csv(&table).unwrap()).unwrap();
        assert_eq!(out, "\"Note, long\",Empty\r\n\"say \"\"hi\"\"\nbye\",\r\n");
    }

    #[test]
    fn test_empty_table_is_header_only() {
        let table = LabeledTable {
            headers: vec!["A".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(write_csv(&table).unwrap(), b"A\r\n");
    }
}
