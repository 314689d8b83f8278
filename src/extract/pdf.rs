//! PDF text extraction via Poppler's command-line tools.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::format::{validate_document, DocumentFormat};
use super::sampling::{sample_units, DocumentHandle, SamplingPolicy};
use super::{DocumentReader, ExtractionError};

pub const PDF_SAMPLING_THRESHOLD: usize = 10;
pub const PDF_SAMPLE_SIZE: usize = 5;
pub const PDF_OMISSION_MARKER: &str = "... (intermediate pages content omitted) ...";

const PDFINFO_NOT_FOUND: &str = "pdfinfo (install poppler-utils)";
const PDFTOTEXT_NOT_FOUND: &str = "pdftotext (install poppler-utils)";

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::CorruptDocument(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Parse the `Pages:` line out of `pdfinfo` output.
fn parse_page_count(pdfinfo_output: &str) -> Option<usize> {
    pdfinfo_output
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Get the page count of a PDF.
pub fn pdf_page_count(file_path: &Path) -> Result<usize, ExtractionError> {
    let output = Command::new("pdfinfo").arg(file_path).output();
    let stdout = handle_cmd_output(output, PDFINFO_NOT_FOUND, "pdfinfo failed")?;

    parse_page_count(&stdout).ok_or_else(|| {
        ExtractionError::CorruptDocument("pdfinfo reported no page count".to_string())
    })
}

/// Run pdftotext on a single (1-based) page of a PDF file.
pub fn pdf_page_text(file_path: &Path, page: usize) -> Result<String, ExtractionError> {
    let page_str = page.to_string();
    let output = Command::new("pdftotext")
        .args(["-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
        .arg(file_path)
        .arg("-") // Output to stdout
        .output();

    handle_cmd_output(
        output,
        PDFTOTEXT_NOT_FOUND,
        &format!("pdftotext failed on page {}", page),
    )
}

/// An open PDF. Units are pages.
#[derive(Debug)]
pub struct PdfDocument {
    path: PathBuf,
    page_count: usize,
}

impl PdfDocument {
    /// Open a PDF and read its page count. Fails for encrypted or damaged files.
    pub fn open(path: &Path) -> Result<Self, ExtractionError> {
        let page_count = pdf_page_count(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            page_count,
        })
    }
}

impl DocumentHandle for PdfDocument {
    fn unit_count(&self) -> usize {
        self.page_count
    }

    fn unit_parts(&mut self, index: usize) -> Result<Vec<String>, ExtractionError> {
        // pdftotext separates pages with form feeds
        let text = pdf_page_text(&self.path, index + 1)?;
        Ok(vec![text.replace('\x0c', "")])
    }
}

/// Native text reader for PDF files.
#[derive(Debug, Clone)]
pub struct PdfReader {
    policy: SamplingPolicy,
}

impl PdfReader {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self { policy }
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new(SamplingPolicy::new(
            PDF_SAMPLING_THRESHOLD,
            PDF_SAMPLE_SIZE,
            PDF_OMISSION_MARKER,
        ))
    }
}

impl DocumentReader for PdfReader {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        validate_document(path, DocumentFormat::Pdf)?;

        let mut document = PdfDocument::open(path)?;
        tracing::debug!(
            "Reading {} ({} pages)",
            path.display(),
            document.unit_count()
        );
        sample_units(&mut document, &self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_page_count() {
        let output = "Title:          Annual report\n\
                      Producer:       LibreOffice\n\
                      Pages:          42\n\
                      Encrypted:      no\n";
        assert_eq!(parse_page_count(output), Some(42));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    #[test]
    fn test_reader_rejects_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = PdfReader::default()
            .extract(&temp.path().join("missing.pdf"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NotFound(_)));
    }

    #[test]
    fn test_reader_rejects_other_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("letter.docx");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let err = PdfReader::default().extract(&path).unwrap_err();
        assert_eq!(err.to_string(), "File is not PDF: .docx");
    }

    #[test]
    fn test_reader_rejects_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("zero.pdf");
        std::fs::write(&path, b"").unwrap();

        let err = PdfReader::default().extract(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::Format(_)));
    }
}
