//! CSV text extraction.
//!
//! Rows are read with the `csv` crate without a header row and with ragged
//! rows allowed. The file must be UTF-8.

use std::path::Path;

use super::format::{validate_document, DocumentFormat};
use super::tabular::{row_line, sample_rows, TABLE_MAX_CHARS};
use super::{DocumentReader, ExtractionError};

/// Read every non-blank row of a CSV file.
pub fn csv_rows(path: &Path) -> Result<Vec<String>, ExtractionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ExtractionError::CorruptDocument(format!("cannot open CSV: {}", e)))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            ExtractionError::CorruptDocument(format!("malformed CSV: {}", e))
        })?;
        if let Some(line) = row_line(record.iter()) {
            rows.push(line);
        }
    }
    Ok(rows)
}

/// Native text reader for CSV files.
#[derive(Debug, Clone)]
pub struct CsvReader {
    max_chars: usize,
}

impl CsvReader {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new(TABLE_MAX_CHARS)
    }
}

impl DocumentReader for CsvReader {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Csv
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        validate_document(path, DocumentFormat::Csv)?;

        let rows = csv_rows(path)?;
        tracing::debug!("Reading {} ({} rows)", path.display(), rows.len());
        Ok(sample_rows(&rows, self.max_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tabular::TABLE_OMISSION_MARKER;
    use tempfile::TempDir;

    #[test]
    fn test_extract_small_csv() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("people.csv");
        std::fs::write(
            &path,
            "name,city,notes\nAna,Lisboa,\n,,\n\"Silva, J.\",Porto,\"said \"\"hi\"\"\"\nshort\n",
        )
        .unwrap();

        let text = CsvReader::default().extract(&path).unwrap();
        assert_eq!(
            text,
            "name city notes\nAna Lisboa\nSilva, J. Porto said \"hi\"\nshort"
        );
    }

    #[test]
    fn test_large_csv_is_sampled() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ledger.csv");
        let mut body = String::new();
        for i in 1..=1000 {
            body.push_str(&format!("{:04},entry\n", i));
        }
        std::fs::write(&path, body).unwrap();

        // Each row renders as "0001 entry" (10 characters)
        let text = CsvReader::new(100).extract(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "0001 entry");
        assert_eq!(lines[4], "0005 entry");
        assert_eq!(lines[5], TABLE_OMISSION_MARKER);
        assert_eq!(lines[6], "0996 entry");
        assert_eq!(lines[10], "1000 entry");
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("latin1.csv");
        std::fs::write(&path, b"nome,cidade\nJo\xe3o,S\xe3o Paulo\n").unwrap();

        let err = CsvReader::default().extract(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::CorruptDocument(_)));
    }

    #[test]
    fn test_binary_content_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("image.csv");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();

        let err = CsvReader::default().extract(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::Format(_)));
    }
}
