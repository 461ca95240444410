//! PDF table writer
//!
//! Renders a [`LabeledTable`] as a paginated PDF 1.4 document using the two
//! standard Helvetica faces, so no font data has to be embedded. The header row is
//! repeated in bold at the top of every page.
//!
//! Text is limited to printable ASCII; other characters are written as `?`. Cells
//! too wide for their column are cut and end in `...`.

use crate::export::{ExportError, LabeledTable};
use chrono::Utc;
use serde::{Deserialize, Serialize};

const MM_TO_PT: f64 = 2.83465;
const MARGIN: f64 = 40.0;
// Average Helvetica glyph width as a fraction of the font size
const GLYPH_WIDTH: f64 = 0.5;
const CELL_PADDING: f64 = 3.0;

/// Layout options for PDF exports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    pub page_size: PageSize,
    pub orientation: PageOrientation,
    /// Font size for table cells (in points)
    pub font_size: u8,
    /// Header text (appears at top of each page)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Footer text (appears at bottom of each page)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    pub show_page_numbers: bool,
    /// Include generation timestamp
    pub show_timestamp: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            orientation: PageOrientation::default(),
            font_size: 9,
            header: None,
            footer: None,
            show_page_numbers: true,
            show_timestamp: true,
        }
    }
}

/// Page size options
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// A4 paper size (210 x 297 mm)
    #[default]
    A4,
    /// US Letter size (8.5 x 11 inches)
    Letter,
}

impl PageSize {
    /// Get page dimensions in millimeters (width, height)
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    Portrait,
    /// Wide tables fit better across the long edge
    #[default]
    Landscape,
}

/// Writes tables as PDF documents
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: PdfOptions,
}

struct Layout {
    width: f64,
    height: f64,
    font_size: f64,
    line_height: f64,
    column_width: f64,
    max_cell_chars: usize,
    rows_per_page: usize,
}

impl PdfWriter {
    pub fn new(options: PdfOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PdfOptions {
        &self.options
    }

    /// Page width and height in points, orientation applied
    pub fn page_dimensions_pt(&self) -> (f64, f64) {
        let (w, h) = self.options.page_size.dimensions_mm();
        let (w, h) = (w * MM_TO_PT, h * MM_TO_PT);
        match self.options.orientation {
            PageOrientation::Portrait => (w, h),
            PageOrientation::Landscape => (h, w),
        }
    }

    fn layout(&self, columns: usize) -> Layout {
        let (width, height) = self.page_dimensions_pt();
        let font_size = f64::from(self.options.font_size.max(4));
        let line_height = font_size * 1.4;
        let column_width = (width - 2.0 * MARGIN) / columns.max(1) as f64;
        let max_cell_chars =
            (((column_width - CELL_PADDING * 2.0) / (font_size * GLYPH_WIDTH)) as usize).max(1);

        // Title, optional header and the column header row above the data;
        // footer line below it.
        let top_lines = if self.options.header.is_some() { 4.0 } else { 3.0 };
        let usable = height - 2.0 * MARGIN - top_lines * line_height - 2.0 * line_height;
        let rows_per_page = ((usable / line_height) as usize).max(1);

        Layout {
            width,
            height,
            font_size,
            line_height,
            column_width,
            max_cell_chars,
            rows_per_page,
        }
    }

    /// Number of pages `table` will occupy
    pub fn page_count(&self, table: &LabeledTable) -> usize {
        let layout = self.layout(table.headers.len());
        table.rows.len().div_ceil(layout.rows_per_page).max(1)
    }

    /// Render `table` under `title`
    pub fn write(&self, title: &str, table: &LabeledTable) -> Result<Vec<u8>, ExportError> {
        if table.headers.is_empty() {
            return Err(ExportError::Validation(
                "PDF export needs at least one column".to_string(),
            ));
        }
        let layout = self.layout(table.headers.len());
        let cells: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_raw_string()).collect())
            .collect();
        let chunks: Vec<&[Vec<String>]> = if cells.is_empty() {
            vec![&cells[..]]
        } else {
            cells.chunks(layout.rows_per_page).collect()
        };
        let page_count = chunks.len();
        let timestamp = Utc::now();

        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n");
        pdf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        // Fixed objects 1-5, then a page and a content stream per page
        let mut xref_positions: Vec<usize> = Vec::new();

        xref_positions.push(pdf.len());
        pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        xref_positions.push(pdf.len());
        let kids: Vec<String> = (0..page_count)
            .map(|i| format!("{} 0 R", page_object_id(i)))
            .collect();
        pdf.extend_from_slice(
            format!(
                "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
                kids.join(" "),
                page_count
            )
            .as_bytes(),
        );

        xref_positions.push(pdf.len());
        pdf.extend_from_slice(
            b"3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>\nendobj\n",
        );

        xref_positions.push(pdf.len());
        pdf.extend_from_slice(
            b"4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>\nendobj\n",
        );

        xref_positions.push(pdf.len());
        let creation_date = if self.options.show_timestamp {
            format!(" /CreationDate ({})", timestamp.format("D:%Y%m%d%H%M%SZ"))
        } else {
            String::new()
        };
        pdf.extend_from_slice(
            format!(
                "5 0 obj\n<< /Title ({}) /Producer (Custom Export SDK){} >>\nendobj\n",
                pdf_text(title),
                creation_date
            )
            .as_bytes(),
        );

        let generated = timestamp.format("%Y-%m-%d %H:%M UTC").to_string();
        for (index, rows) in chunks.iter().enumerate() {
            xref_positions.push(pdf.len());
            pdf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents {} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> >>\nendobj\n",
                    page_object_id(index),
                    layout.width,
                    layout.height,
                    page_object_id(index) + 1
                )
                .as_bytes(),
            );

            xref_positions.push(pdf.len());
            let stream =
                self.page_stream(&layout, title, &table.headers, rows, index, page_count, &generated);
            pdf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Length {} >>\nstream\n{}endstream\nendobj\n",
                    page_object_id(index) + 1,
                    stream.len(),
                    stream
                )
                .as_bytes(),
            );
        }

        let xref_start = pdf.len();
        pdf.extend_from_slice(b"xref\n");
        pdf.extend_from_slice(format!("0 {}\n", xref_positions.len() + 1).as_bytes());
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        for pos in &xref_positions {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", pos).as_bytes());
        }

        pdf.extend_from_slice(b"trailer\n");
        pdf.extend_from_slice(
            format!(
                "<< /Size {} /Root 1 0 R /Info 5 0 R >>\n",
                xref_positions.len() + 1
            )
            .as_bytes(),
        );
        pdf.extend_from_slice(b"startxref\n");
        pdf.extend_from_slice(format!("{}\n", xref_start).as_bytes());
        pdf.extend_from_slice(b"%%EOF\n");

        Ok(pdf)
    }

    #[allow(clippy::too_many_arguments)]
    fn page_stream(
        &self,
        layout: &Layout,
        title: &str,
        headers: &[String],
        rows: &[Vec<String>],
        page_index: usize,
        page_count: usize,
        generated: &str,
    ) -> String {
        let mut stream = String::new();
        let mut y = layout.height - MARGIN;

        if let Some(header) = &self.options.header {
            text_at(&mut stream, "F1", layout.font_size, MARGIN, y, &pdf_text(header));
            y -= layout.line_height;
        }

        text_at(&mut stream, "F2", layout.font_size + 4.0, MARGIN, y, &pdf_text(title));
        y -= layout.line_height * 2.0;

        for (col, label) in headers.iter().enumerate() {
            let x = MARGIN + col as f64 * layout.column_width + CELL_PADDING;
            let text = pdf_text(&clip(label, layout.max_cell_chars));
            text_at(&mut stream, "F2", layout.font_size, x, y, &text);
        }
        let rule_y = y - layout.line_height * 0.35;
        stream.push_str(&format!(
            "0.5 w {:.2} {:.2} m {:.2} {:.2} l S\n",
            MARGIN,
            rule_y,
            layout.width - MARGIN,
            rule_y
        ));
        y -= layout.line_height;

        for row in rows {
            for (col, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let x = MARGIN + col as f64 * layout.column_width + CELL_PADDING;
                let text = pdf_text(&clip(cell, layout.max_cell_chars));
                text_at(&mut stream, "F1", layout.font_size, x, y, &text);
            }
            y -= layout.line_height;
        }

        let mut footer_parts = Vec::new();
        if let Some(footer) = &self.options.footer {
            footer_parts.push(footer.clone());
        }
        if self.options.show_timestamp {
            footer_parts.push(format!("Generated {}", generated));
        }
        if self.options.show_page_numbers {
            footer_parts.push(format!("Page {} of {}", page_index + 1, page_count));
        }
        if !footer_parts.is_empty() {
            let footer_size = (layout.font_size - 1.0).max(4.0);
            let text = pdf_text(&footer_parts.join("  |  "));
            text_at(&mut stream, "F1", footer_size, MARGIN, MARGIN, &text);
        }

        stream
    }
}

fn page_object_id(page_index: usize) -> usize {
    6 + page_index * 2
}

fn text_at(stream: &mut String, font: &str, size: f64, x: f64, y: f64, text: &str) {
    stream.push_str(&format!(
        "BT /{} {:.1} Tf {:.2} {:.2} Td ({}) Tj ET\n",
        font, size, x, y, text
    ));
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`
fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut clipped: String = text.chars().take(max_chars - 3).collect();
    clipped.push_str("...");
    clipped
}

/// Escape special characters for PDF strings.
///
/// Non-ASCII text is written as octal WinAnsi codes to match the font encoding;
/// characters outside WinAnsi become `?`.
fn pdf_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' | '\r' | '\t' => out.push(' '),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c if c.is_control() => out.push(' '),
            c => match win_ansi_code(c) {
                Some(code) => out.push_str(&format!("\\{:03o}", code)),
                None => out.push('?'),
            },
        }
    }
    out
}

/// WinAnsiEncoding byte for a non-ASCII character
fn win_ansi_code(c: char) -> Option<u8> {
    let code = match c {
        '\u{A0}'..='\u{FF}' => return u8::try_from(u32::from(c)).ok(),
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn table(rows: usize) -> LabeledTable {
        LabeledTable {
            headers: vec!["Name".to_string(), "Salary".to_string()],
            rows: (0..rows)
                .map(|i| vec![FieldValue::Text(format!("row {}", i)), FieldValue::Int(i as i64)])
                .collect(),
        }
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_pdf_options_default() {
        let options = PdfOptions::default();
        assert!(options.show_page_numbers);
        assert!(options.show_timestamp);
        assert_eq!(options.font_size, 9);
        assert_eq!(options.page_size, PageSize::A4);
        assert_eq!(options.orientation, PageOrientation::Landscape);
    }

    #[test]
    fn test_page_size_dimensions() {
        let (w, h) = PageSize::A4.dimensions_mm();
        assert_eq!(w, 210.0);
        assert_eq!(h, 297.0);

        let portrait = PdfWriter::new(PdfOptions {
            page_size: PageSize::Letter,
            orientation: PageOrientation::Portrait,
            ..Default::default()
        });
        let (w, h) = portrait.page_dimensions_pt();
        assert!(w < h);
        assert!((w - 612.0).abs() < 0.5);
    }

    #[test]
    fn test_document_structure() {
        let bytes = PdfWriter::default().write("staff-export", &table(3)).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("(Name) Tj"));
        assert!(text.contains("(row 2) Tj"));
        assert!(text.contains("Page 1 of 1"));
    }

    #[test]
    fn test_paginates_and_repeats_header() {
        let writer = PdfWriter::default();
        let data = table(500);
        let pages = writer.page_count(&data);
        assert!(pages > 1);

        let bytes = writer.write("big", &data).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert_eq!(count(&text, "/Type /Page "), pages);
        assert_eq!(count(&text, "(Name) Tj"), pages);
        assert!(text.contains(&format!("/Count {}", pages)));
        assert!(text.contains("(row 499) Tj"));
    }

    #[test]
    fn test_empty_table_has_one_page() {
        let writer = PdfWriter::default();
        assert_eq!(writer.page_count(&table(0)), 1);
        let bytes = writer.write("empty", &table(0)).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert_eq!(count(&text, "/Type /Page "), 1);
    }

    #[test]
    fn test_header_footer_and_no_timestamp() {
        let writer = PdfWriter::new(PdfOptions {
            header: Some("Acme (internal)".to_string()),
            footer: Some("Confidential".to_string()),
            show_timestamp: false,
            show_page_numbers: false,
            ..Default::default()
        });
        let bytes = writer.write("t", &table(1)).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("(Acme \\(internal\\)) Tj"));
        assert!(text.contains("(Confidential) Tj"));
        assert!(!text.contains("CreationDate"));
        assert!(!text.contains("Page 1 of"));
    }

    #[test]
    fn test_pdf_text_escaping() {
        assert_eq!(pdf_text("Test (with) special\\chars"), "Test \\(with\\) special\\\\chars");
        assert_eq!(pdf_text("Zo\u{EB}\nNext"), "Zo\\353 Next");
    }

    #[test]
    fn test_pdf_text_win_ansi() {
        assert_eq!(pdf_text("Pr\u{E9}nom"), "Pr\\351nom");
        assert_eq!(pdf_text("\u{20AC}5 \u{2013} \u{201C}ok\u{201D}"), "\\2005 \\226 \\223ok\\224");
        assert_eq!(pdf_text("\u{65E5}\u{672C}"), "??");
    }

    #[test]
    fn test_latin1_names_survive_in_document() {
        let data = LabeledTable {
            headers: vec!["Pr\u{E9}nom".to_string()],
            rows: vec![vec![FieldValue::text("Zo\u{EB} M\u{FC}ller")]],
        };
        let bytes = PdfWriter::default().write("people", &data).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("(Pr\\351nom) Tj"));
        assert!(text.contains("(Zo\\353 M\\374ller) Tj"));
        assert!(!text.contains("Pr?nom"));
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("a long cell value", 8), "a lon...");
        assert_eq!(clip("abcdef", 2), "ab");
    }
}
