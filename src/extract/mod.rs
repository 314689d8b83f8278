//! Native text extraction from documents.
//!
//! Each supported format has a [`DocumentReader`]:
//! - [`PdfReader`] reads pages through Poppler's `pdfinfo` / `pdftotext`
//! - [`DocxReader`] reads body paragraphs and tables from the DOCX container
//! - [`CsvReader`] and [`XlsxReader`] read table rows
//!
//! Page and paragraph readers share the head/tail sampling policy in
//! [`sampling`]; row readers spend a character budget ([`tabular`]). Both
//! bound the work done on very large documents.

pub mod csv;
pub mod docx;
mod format;
pub mod pdf;
pub mod sampling;
pub mod tabular;
pub mod xlsx;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use self::csv::CsvReader;
pub use docx::{DocxDocument, DocxReader, DOCX_OMISSION_MARKER};
pub use format::{validate_document, DocumentFormat};
pub use pdf::{PdfDocument, PdfReader, PDF_OMISSION_MARKER};
pub use sampling::{sample_units, DocumentHandle, SamplingPolicy};
pub use tabular::{TABLE_MAX_CHARS, TABLE_OMISSION_MARKER};
pub use xlsx::XlsxReader;

/// Errors that can occur while reading a document's native text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{0}")]
    Format(String),

    #[error("Cannot open document: {0}")]
    CorruptDocument(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A format-specific native text extractor.
pub trait DocumentReader: Send + Sync {
    /// The format this reader accepts.
    fn format(&self) -> DocumentFormat;

    /// Extract the document's text, sampling head and tail units when the
    /// document is larger than the reader's sampling threshold.
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Size limits handed to the default readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderLimits {
    pub pdf: SamplingPolicy,
    pub docx: SamplingPolicy,
    /// Character budget for CSV and spreadsheet rows.
    pub table_max_chars: usize,
}

/// Build the default reader for a format.
pub fn reader_for(format: DocumentFormat, limits: &ReaderLimits) -> Box<dyn DocumentReader> {
    match format {
        DocumentFormat::Pdf => Box::new(PdfReader::new(limits.pdf)),
        DocumentFormat::Docx => Box::new(DocxReader::new(limits.docx)),
        DocumentFormat::Csv => Box::new(CsvReader::new(limits.table_max_chars)),
        DocumentFormat::Xlsx => Box::new(XlsxReader::new(limits.table_max_chars)),
    }
}
