//! Excel workbook text extraction (`.xlsx`, `.xlsm`) using calamine.
//!
//! Every worksheet is read in workbook order; its non-blank rows become
//! units for the shared row budget.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};

use super::format::{validate_document, DocumentFormat};
use super::tabular::{row_line, sample_rows, TABLE_MAX_CHARS};
use super::{DocumentReader, ExtractionError};

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR:{e:?}"),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Read every non-blank row of every worksheet.
pub fn workbook_rows(path: &Path) -> Result<Vec<String>, ExtractionError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        ExtractionError::CorruptDocument(format!("not a valid Excel workbook: {}", e))
    })?;

    let mut rows = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            ExtractionError::CorruptDocument(format!("cannot read sheet '{}': {}", sheet_name, e))
        })?;
        let before = rows.len();
        rows.extend(range.rows().filter_map(|row| row_line(row.iter().map(cell_text))));
        tracing::trace!("Sheet '{}': {} rows", sheet_name, rows.len() - before);
    }
    Ok(rows)
}

/// Native text reader for Excel workbooks.
#[derive(Debug, Clone)]
pub struct XlsxReader {
    max_chars: usize,
}

impl XlsxReader {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for XlsxReader {
    fn default() -> Self {
        Self::new(TABLE_MAX_CHARS)
    }
}

impl DocumentReader for XlsxReader {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Xlsx
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        validate_document(path, DocumentFormat::Xlsx)?;

        let rows = workbook_rows(path)?;
        tracing::debug!("Reading {} ({} rows)", path.display(), rows.len());
        Ok(sample_rows(&rows, self.max_chars))
    }
}
