//! XLSX writer
//!
//! Builds a minimal Office Open XML workbook: one worksheet named
//! [`SHEET_NAME`] with a bold, frozen header row. Integers, finite floats and
//! booleans are written as typed cells; everything else as inline strings holding
//! the raw value.

use crate::export::xml::is_xml_char;
use crate::export::{ExportError, LabeledTable};
use crate::models::FieldValue;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::FileOptions;

pub const SHEET_NAME: &str = "Export Data";

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Style 0 is the default, style 1 the bold header font.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

const HEADER_STYLE: &str = "1";

fn xlsx_err<E: std::fmt::Display>(e: E) -> ExportError {
    ExportError::Serialization(format!("Failed to write XLSX: {}", e))
}

/// Spreadsheet column letters for a zero-based index (0 -> A, 26 -> AA)
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

pub fn write_xlsx(table: &LabeledTable) -> Result<Vec<u8>, ExportError> {
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SPREADSHEET_NS, SHEET_NAME
    );
    let sheet = worksheet(table)?;

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("xl/workbook.xml", workbook.as_bytes()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
        ("xl/styles.xml", STYLES.as_bytes()),
        ("xl/worksheets/sheet1.xml", &sheet),
    ];
    for (name, content) in parts {
        zip.start_file(name, options).map_err(xlsx_err)?;
        zip.write_all(content).map_err(xlsx_err)?;
    }
    let cursor = zip.finish().map_err(xlsx_err)?;
    Ok(cursor.into_inner())
}

fn worksheet(table: &LabeledTable) -> Result<Vec<u8>, ExportError> {
    let mut xml = Writer::new(Vec::new());
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xlsx_err)?;
    xml.write_event(Event::Start(
        BytesStart::new("worksheet").with_attributes([("xmlns", SPREADSHEET_NS)]),
    ))
    .map_err(xlsx_err)?;

    // Keep the header visible while scrolling
    xml.write_event(Event::Start(BytesStart::new("sheetViews")))
        .map_err(xlsx_err)?;
    xml.write_event(Event::Start(
        BytesStart::new("sheetView").with_attributes([("workbookViewId", "0")]),
    ))
    .map_err(xlsx_err)?;
    xml.write_event(Event::Empty(BytesStart::new("pane").with_attributes([
        ("ySplit", "1"),
        ("topLeftCell", "A2"),
        ("activePane", "bottomLeft"),
        ("state", "frozen"),
    ])))
    .map_err(xlsx_err)?;
    xml.write_event(Event::End(BytesEnd::new("sheetView")))
        .map_err(xlsx_err)?;
    xml.write_event(Event::End(BytesEnd::new("sheetViews")))
        .map_err(xlsx_err)?;

    xml.write_event(Event::Start(BytesStart::new("sheetData")))
        .map_err(xlsx_err)?;

    write_row_start(&mut xml, 1)?;
    for (col, label) in table.headers.iter().enumerate() {
        let cell_ref = format!("{}1", column_letters(col));
        write_string_cell(&mut xml, &cell_ref, label, Some(HEADER_STYLE))?;
    }
    xml.write_event(Event::End(BytesEnd::new("row")))
        .map_err(xlsx_err)?;

    for (index, row) in table.rows.iter().enumerate() {
        let row_number = index + 2;
        write_row_start(&mut xml, row_number)?;
        for (col, value) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", column_letters(col), row_number);
            match value {
                FieldValue::Null => {}
                FieldValue::Int(i) => write_value_cell(&mut xml, &cell_ref, None, &i.to_string())?,
                FieldValue::Float(f) if f.is_finite() => {
                    write_value_cell(&mut xml, &cell_ref, None, &f.to_string())?
                }
                FieldValue::Bool(b) => {
                    write_value_cell(&mut xml, &cell_ref, Some("b"), if *b { "1" } else { "0" })?
                }
                other => write_string_cell(&mut xml, &cell_ref, &other.to_raw_string(), None)?,
            }
        }
        xml.write_event(Event::End(BytesEnd::new("row")))
            .map_err(xlsx_err)?;
    }

    xml.write_event(Event::End(BytesEnd::new("sheetData")))
        .map_err(xlsx_err)?;
    xml.write_event(Event::End(BytesEnd::new("worksheet")))
        .map_err(xlsx_err)?;
    Ok(xml.into_inner())
}

fn write_row_start(xml: &mut Writer<Vec<u8>>, row_number: usize) -> Result<(), ExportError> {
    let r = row_number.to_string();
    xml.write_event(Event::Start(
        BytesStart::new("row").with_attributes([("r", r.as_str())]),
    ))
    .map_err(xlsx_err)
}

fn write_value_cell(
    xml: &mut Writer<Vec<u8>>,
    cell_ref: &str,
    cell_type: Option<&str>,
    value: &str,
) -> Result<(), ExportError> {
    let mut cell = BytesStart::new("c").with_attributes([("r", cell_ref)]);
    if let Some(t) = cell_type {
        cell.push_attribute(("t", t));
    }
    xml.write_event(Event::Start(cell)).map_err(xlsx_err)?;
    xml.write_event(Event::Start(BytesStart::new("v")))
        .map_err(xlsx_err)?;
    xml.write_event(Event::Text(BytesText::new(value)))
        .map_err(xlsx_err)?;
    xml.write_event(Event::End(BytesEnd::new("v")))
        .map_err(xlsx_err)?;
    xml.write_event(Event::End(BytesEnd::new("c")))
        .map_err(xlsx_err)
}

fn write_string_cell(
    xml: &mut Writer<Vec<u8>>,
    cell_ref: &str,
    text: &str,
    style: Option<&str>,
) -> Result<(), ExportError> {
    if let Some(bad) = text.chars().find(|c| !is_xml_char(*c)) {
        return Err(ExportError::Serialization(format!(
            "Cell {} contains character U+{:04X}, which XLSX cannot represent",
            cell_ref, bad as u32
        )));
    }
    let mut cell = BytesStart::new("c").with_attributes([("r", cell_ref), ("t", "inlineStr")]);
    if let Some(s) = style {
        cell.push_attribute(("s", s));
    }
    let mut t = BytesStart::new("t");
    if text.trim() != text {
        t.push_attribute(("xml:space", "preserve"));
    }
    xml.write_event(Event::Start(cell)).map_err(xlsx_err)?;
    xml.write_event(Event::Start(BytesStart::new("is")))
        .map_err(xlsx_err)?;
    xml.write_event(Event::Start(t)).map_err(xlsx_err)?;
    xml.write_event(Event::Text(BytesText::new(text)))
        .map_err(xlsx_err)?;
    xml.write_event(Event::End(BytesEnd::new("t")))
        .map_err(xlsx_err)?;
    xml.write_event(Event::End(BytesEnd::new("is")))
        .map_err(xlsx_err)?;
    xml.write_event(Event::End(BytesEnd::new("c")))
        .map_err(xlsx_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    fn table() -> LabeledTable {
        LabeledTable {
            headers: vec!["Name".to_string(), "Salary".to_string(), "Active".to_string()],
            rows: vec![
                vec![FieldValue::text("Ada"), FieldValue::Int(5000), FieldValue::Bool(true)],
                vec![FieldValue::text(" padded "), FieldValue::Null, FieldValue::Bool(false)],
            ],
        }
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_package_parts() {
        let bytes = write_xlsx(&table()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"<sheet name="Export Data""#));
        let styles = read_part(&bytes, "xl/styles.xml");
        assert!(styles.contains("<b/>"));
        assert!(read_part(&bytes, "[Content_Types].xml").contains("/xl/worksheets/sheet1.xml"));
    }

    #[test]
    fn test_sheet_cells() {
        let bytes = write_xlsx(&table()).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<c r="A1" t="inlineStr" s="1"><is><t>Name</t></is></c>"#));
        assert!(sheet.contains(r#"<c r="B2"><v>5000</v></c>"#));
        assert!(sheet.contains(r#"<c r="C2" t="b"><v>1</v></c>"#));
        assert!(sheet.contains(r#"<t xml:space="preserve"> padded </t>"#));
        assert!(!sheet.contains(r#"r="B3""#));
        assert!(sheet.contains(r#"state="frozen""#));
    }

    #[test]
    fn test_illegal_character_fails() {
        let table = LabeledTable {
            headers: vec!["Name".to_string()],
            rows: vec![vec![FieldValue::text("a\u{0}b")]],
        };
        assert!(matches!(write_xlsx(&table), Err(ExportError::Serialization(_))));
    }
}
