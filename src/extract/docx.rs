//! DOCX text extraction.
//!
//! Reads `word/document.xml` out of the zip container and walks the body
//! with quick-xml. Units are top-level body paragraphs. Tables are anchored
//! to the paragraph that precedes them, so a table is kept exactly when its
//! anchor paragraph is kept; tables that come before any paragraph belong to
//! the head of the document.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::format::{validate_document, DocumentFormat};
use super::sampling::{sample_units, DocumentHandle, SamplingPolicy};
use super::{DocumentReader, ExtractionError};

pub const DOCX_SAMPLING_THRESHOLD: usize = 180;
pub const DOCX_SAMPLE_SIZE: usize = 90;
pub const DOCX_OMISSION_MARKER: &str = "... (intermediate paragraph content omitted) ...";

const DOCUMENT_PART: &str = "word/document.xml";

/// A body paragraph and the table cells anchored after it.
#[derive(Debug, Default, Clone, PartialEq)]
struct Paragraph {
    text: String,
    anchored_cells: Vec<String>,
}

/// Parsed document body.
#[derive(Debug, Default, Clone, PartialEq)]
struct DocxBody {
    /// Cells of tables appearing before the first paragraph.
    leading_cells: Vec<String>,
    paragraphs: Vec<Paragraph>,
}

/// Where text currently being read belongs.
#[derive(Default)]
struct BodyParser {
    body: DocxBody,
    in_text: bool,
    /// Inside a `w:r`. Tabs and breaks only count as text within a run;
    /// `w:tab` also appears in paragraph properties as a tab stop.
    run_depth: usize,
    /// Nesting of `w:p` (text boxes nest paragraphs inside paragraphs).
    paragraph_depth: usize,
    paragraph: String,
    table_depth: usize,
    table_cells: Vec<String>,
    cell: String,
}

impl BodyParser {
    fn target(&mut self) -> Option<&mut String> {
        if self.table_depth > 0 {
            Some(&mut self.cell)
        } else if self.paragraph_depth > 0 {
            Some(&mut self.paragraph)
        } else {
            None
        }
    }

    fn push_str(&mut self, s: &str) {
        if let Some(target) = self.target() {
            target.push_str(s);
        }
    }

    fn start(&mut self, name: &[u8]) {
        match name {
            b"w:t" => self.in_text = true,
            b"w:r" => self.run_depth += 1,
            b"w:tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table_cells.clear();
                }
            }
            b"w:tc" if self.table_depth == 1 => self.cell.clear(),
            b"w:p" if self.table_depth > 0 => {
                // Paragraph break inside a cell
                if !self.cell.is_empty() {
                    self.cell.push('\n');
                }
            }
            b"w:p" => {
                if self.paragraph_depth == 0 {
                    self.paragraph.clear();
                }
                self.paragraph_depth += 1;
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:t" => self.in_text = false,
            b"w:r" => self.run_depth = self.run_depth.saturating_sub(1),
            b"w:tc" if self.table_depth == 1 => {
                let cell = std::mem::take(&mut self.cell);
                self.table_cells.push(cell.trim().to_string());
            }
            b"w:tbl" if self.table_depth > 0 => {
                self.table_depth -= 1;
                if self.table_depth == 0 {
                    let cells = std::mem::take(&mut self.table_cells);
                    match self.body.paragraphs.last_mut() {
                        Some(anchor) => anchor.anchored_cells.extend(cells),
                        None => self.body.leading_cells.extend(cells),
                    }
                }
            }
            b"w:p" if self.table_depth == 0 && self.paragraph_depth > 0 => {
                self.paragraph_depth -= 1;
                if self.paragraph_depth == 0 {
                    self.finish_paragraph();
                }
            }
            _ => {}
        }
    }

    fn empty(&mut self, name: &[u8]) {
        match name {
            b"w:tab" if self.run_depth > 0 => self.push_str("\t"),
            b"w:br" | b"w:cr" if self.run_depth > 0 => self.push_str("\n"),
            // <w:p/> is an empty paragraph; it still counts as a unit
            b"w:p" if self.table_depth == 0 && self.paragraph_depth == 0 => {
                self.paragraph.clear();
                self.finish_paragraph();
            }
            _ => {}
        }
    }

    fn finish_paragraph(&mut self) {
        let text = std::mem::take(&mut self.paragraph);
        self.body.paragraphs.push(Paragraph {
            text,
            anchored_cells: Vec::new(),
        });
    }
}

/// Parse the WordprocessingML main document part.
fn parse_document_xml(xml: &str) -> Result<DocxBody, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut parser = BodyParser::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.start(e.name().as_ref()),
            Ok(Event::End(e)) => parser.end(e.name().as_ref()),
            Ok(Event::Empty(e)) => parser.empty(e.name().as_ref()),
            Ok(Event::Text(e)) if parser.in_text => {
                let text = e.unescape().map_err(|err| {
                    ExtractionError::CorruptDocument(format!("malformed document text: {}", err))
                })?;
                parser.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractionError::CorruptDocument(format!(
                    "malformed {} at position {}: {}",
                    DOCUMENT_PART,
                    reader.buffer_position(),
                    e
                )));
            }
        }
        buf.clear();
    }

    Ok(parser.body)
}

/// An open DOCX document. Units are body paragraphs.
#[derive(Debug)]
pub struct DocxDocument {
    body: DocxBody,
}

impl DocxDocument {
    /// Open the container and parse its main document part.
    pub fn open(path: &Path) -> Result<Self, ExtractionError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file).map_err(|e| {
            ExtractionError::CorruptDocument(format!("not a valid DOCX container: {}", e))
        })?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|_| {
                ExtractionError::CorruptDocument(format!("{} missing from container", DOCUMENT_PART))
            })?
            .read_to_string(&mut xml)
            .map_err(|e| {
                ExtractionError::CorruptDocument(format!("cannot read {}: {}", DOCUMENT_PART, e))
            })?;

        let body = parse_document_xml(&xml)?;
        Ok(Self { body })
    }
}

impl DocumentHandle for DocxDocument {
    fn unit_count(&self) -> usize {
        self.body.paragraphs.len()
    }

    fn leading_parts(&mut self) -> Result<Vec<String>, ExtractionError> {
        Ok(self.body.leading_cells.clone())
    }

    fn unit_parts(&mut self, index: usize) -> Result<Vec<String>, ExtractionError> {
        let paragraph = self.body.paragraphs.get(index).ok_or_else(|| {
            ExtractionError::CorruptDocument(format!("paragraph {} out of range", index))
        })?;

        let mut parts = Vec::with_capacity(1 + paragraph.anchored_cells.len());
        parts.push(paragraph.text.clone());
        parts.extend(paragraph.anchored_cells.iter().cloned());
        Ok(parts)
    }
}

/// Native text reader for DOCX files.
#[derive(Debug, Clone)]
pub struct DocxReader {
    policy: SamplingPolicy,
}

impl DocxReader {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self { policy }
    }
}

impl Default for DocxReader {
    fn default() -> Self {
        Self::new(SamplingPolicy::new(
            DOCX_SAMPLING_THRESHOLD,
            DOCX_SAMPLE_SIZE,
            DOCX_OMISSION_MARKER,
        ))
    }
}

impl DocumentReader for DocxReader {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        validate_document(path, DocumentFormat::Docx)?;

        let mut document = DocxDocument::open(path)?;
        tracing::debug!(
            "Reading {} ({} paragraphs)",
            path.display(),
            document.unit_count()
        );
        sample_units(&mut document, &self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn paragraph(text: &str) -> String {
        format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text)
    }

    fn table(rows: &[&[&str]]) -> String {
        let mut xml = String::from("<w:tbl>");
        for row in rows {
            xml.push_str("<w:tr>");
            for cell in *row {
                xml.push_str(&format!("<w:tc>{}</w:tc>", paragraph(cell)));
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        xml
    }

    fn document_xml(body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}<w:sectPr/></w:body></w:document>",
            body
        )
    }

    fn write_docx(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<?xml version=\"1.0\"?><Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\"/>").unwrap();
        zip.start_file(DOCUMENT_PART, options).unwrap();
        zip.write_all(document_xml(body).as_bytes()).unwrap();
        zip.finish().unwrap();
        path
    }

    #[test]
    fn test_parse_paragraphs_and_runs() {
        let xml = document_xml(
            "<w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t>Tom &amp; Jerry</w:t><w:tab/><w:t>x</w:t></w:r></w:p>",
        );
        let body = parse_document_xml(&xml).unwrap();
        let texts: Vec<_> = body.paragraphs.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello world", "", "Tom & Jerry\tx"]);
    }

    #[test]
    fn test_tables_anchor_to_preceding_paragraph() {
        let xml = document_xml(&format!(
            "{}{}{}{}",
            table(&[&["Top", "Header"]]),
            paragraph("First"),
            table(&[&["a", ""], &["b", "c"]]),
            paragraph("Second"),
        ));
        let body = parse_document_xml(&xml).unwrap();

        assert_eq!(body.leading_cells, vec!["Top", "Header"]);
        assert_eq!(body.paragraphs.len(), 2);
        assert_eq!(body.paragraphs[0].anchored_cells, vec!["a", "", "b", "c"]);
        assert!(body.paragraphs[1].anchored_cells.is_empty());
    }

    #[test]
    fn test_tab_stops_are_not_text() {
        let xml = document_xml(
            "<w:tbl><w:tr><w:tc>\
             <w:p><w:r><w:t>Name</w:t></w:r></w:p>\
             <w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/>\
             <w:tab w:val=\"left\" w:pos=\"1440\"/></w:tabs></w:pPr>\
             <w:r><w:t>Value</w:t></w:r></w:p>\
             </w:tc></w:tr></w:tbl>\
             <w:p><w:pPr><w:tabs><w:tab w:val=\"center\" w:pos=\"4680\"/></w:tabs></w:pPr>\
             <w:r><w:t>Left</w:t><w:tab/><w:t>Right</w:t><w:br/><w:t>Next</w:t></w:r></w:p>",
        );
        let body = parse_document_xml(&xml).unwrap();

        assert_eq!(body.leading_cells, vec!["Name\nValue"]);
        assert_eq!(body.paragraphs[0].text, "Left\tRight\nNext");
    }

    #[test]
    fn test_table_paragraphs_are_not_units() {
        let xml = document_xml(&format!("{}{}", paragraph("Only"), table(&[&["cell"]])));
        let body = parse_document_xml(&xml).unwrap();
        assert_eq!(body.paragraphs.len(), 1);
    }

    #[test]
    fn test_extract_small_docx() {
        let temp = TempDir::new().unwrap();
        let body = format!(
            "{}{}{}{}",
            paragraph("Intro"),
            paragraph("   "),
            table(&[&["Name", "Value"]]),
            paragraph("Outro"),
        );
        let path = write_docx(temp.path(), "small.docx", &body);

        let text = DocxReader::default().extract(&path).unwrap();
        assert_eq!(text, "Intro\n\nName\n\nValue\n\nOutro");
    }

    #[test]
    fn test_extract_large_docx_is_sampled() {
        let temp = TempDir::new().unwrap();
        let mut body = String::new();
        for i in 1..=400 {
            body.push_str(&paragraph(&format!("P{}", i)));
            if i == 50 || i == 350 {
                body.push_str(&table(&[&[&format!("T{}", i)]]));
            }
        }
        let path = write_docx(temp.path(), "large.docx", &body);

        let text = DocxReader::default().extract(&path).unwrap();

        assert_eq!(text.matches(DOCX_OMISSION_MARKER).count(), 1);
        assert!(text.starts_with("P1\n\n"));
        assert!(text.contains("\n\nP90\n\n"));
        assert!(!text.contains("\n\nP91\n\n"));
        assert!(!text.contains("P310\n\n"));
        assert!(text.contains("\n\nP311\n\n"));
        assert!(text.ends_with("P400"));
        // Both anchored tables sit in kept ranges
        assert!(text.contains("P50\n\nT50\n\nP51"));
        assert!(text.contains("P350\n\nT350\n\nP351"));
    }

    #[test]
    fn test_table_in_omitted_range_is_dropped() {
        let temp = TempDir::new().unwrap();
        let mut body = String::new();
        for i in 1..=200 {
            body.push_str(&paragraph(&format!("P{}", i)));
            if i == 100 {
                body.push_str(&table(&[&["hidden"]]));
            }
        }
        let path = write_docx(temp.path(), "middle.docx", &body);

        let text = DocxReader::default().extract(&path).unwrap();
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn test_missing_document_part() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.docx");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("readme.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"not a document").unwrap();
        zip.finish().unwrap();

        let err = DocxReader::default().extract(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::CorruptDocument(_)));
    }

    #[test]
    fn test_docx_without_text() {
        let temp = TempDir::new().unwrap();
        let path = write_docx(temp.path(), "blank.docx", "<w:p/><w:p/>");

        let text = DocxReader::default().extract(&path).unwrap();
        assert!(text.is_empty());
    }
}
