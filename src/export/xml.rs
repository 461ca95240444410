//! XML writer
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <export>
//!   <row>
//!     <First_Name>Ada</First_Name>
//!     <Notes/>
//!   </row>
//! </export>
//! ```
//!
//! Labels become element names after sanitizing. Text content is escaped by the
//! writer, but characters XML 1.0 cannot carry at all are an error.

use crate::export::{ExportError, LabeledTable};
use once_cell::sync::Lazy;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use regex::Regex;
use std::collections::HashSet;

pub const ROOT_ELEMENT: &str = "export";
pub const ROW_ELEMENT: &str = "row";

static INVALID_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("valid regex"));

/// Turn a column label into a valid XML element name.
///
/// Disallowed characters become `_`. Names that would start with a digit, `-`, `.`
/// or the reserved `xml` prefix get a leading `_`.
pub fn element_name(label: &str) -> String {
    let mut name = INVALID_NAME_CHARS
        .replace_all(label.trim(), "_")
        .into_owned();
    let needs_prefix = match name.chars().next() {
        None => true,
        Some(c) => !(c.is_ascii_alphabetic() || c == '_'),
    } || name.to_ascii_lowercase().starts_with("xml");
    if needs_prefix {
        name.insert(0, '_');
    }
    name
}

/// Element names for all headers, suffixed where sanitizing made two collide
fn element_names(headers: &[String]) -> Vec<String> {
    let mut used = HashSet::new();
    headers
        .iter()
        .map(|label| {
            let base = element_name(label);
            let mut name = base.clone();
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
            name
        })
        .collect()
}

pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn xml_err<E: std::fmt::Display>(e: E) -> ExportError {
    ExportError::Serialization(format!("Failed to write XML: {}", e))
}

pub fn write_xml(table: &LabeledTable) -> Result<Vec<u8>, ExportError> {
    let names = element_names(&table.headers);
    let mut xml = Writer::new_with_indent(Vec::new(), b' ', 2);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    xml.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
        .map_err(xml_err)?;

    for (row_index, row) in table.rows.iter().enumerate() {
        xml.write_event(Event::Start(BytesStart::new(ROW_ELEMENT)))
            .map_err(xml_err)?;
        for (name, value) in names.iter().zip(row) {
            let text = value.to_raw_string();
            if let Some(bad) = text.chars().find(|c| !is_xml_char(*c)) {
                return Err(ExportError::Serialization(format!(
                    "Row {} column {} contains character U+{:04X}, which XML cannot represent",
                    row_index + 1,
                    name,
                    bad as u32
                )));
            }
            if text.is_empty() {
                xml.write_event(Event::Empty(BytesStart::new(name.as_str())))
                    .map_err(xml_err)?;
            } else {
                xml.write_event(Event::Start(BytesStart::new(name.as_str())))
                    .map_err(xml_err)?;
                xml.write_event(Event::Text(BytesText::new(&text)))
                    .map_err(xml_err)?;
                xml.write_event(Event::End(BytesEnd::new(name.as_str())))
                    .map_err(xml_err)?;
            }
        }
        xml.write_event(Event::End(BytesEnd::new(ROW_ELEMENT)))
            .map_err(xml_err)?;
    }

    xml.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
        .map_err(xml_err)?;
    Ok(xml.into_inner())
}
