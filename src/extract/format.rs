//! Format detection: extension first, confirmed by magic bytes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::ExtractionError;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Document formats with a native reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Csv,
    /// Excel workbooks, including macro-enabled `.xlsm`.
    Xlsx,
}

impl DocumentFormat {
    /// Determine the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Csv => "CSV",
            Self::Xlsx => "XLSX",
        }
    }

    /// Whether OCR can recover text from this format (rendered pages or
    /// embedded images).
    pub fn supports_ocr(&self) -> bool {
        matches!(self, Self::Pdf | Self::Docx)
    }

    /// Plain-text formats carry no magic bytes to sniff.
    fn is_plain_text(&self) -> bool {
        matches!(self, Self::Csv)
    }

    /// Whether sniffed content matches this format.
    fn accepts_mime(&self, mime: &str) -> bool {
        match self {
            Self::Pdf => mime == "application/pdf",
            // infer reports DOCX either as OOXML or, for unusual member
            // ordering, as a plain zip. The container check happens on open.
            Self::Docx => mime == DOCX_MIME || mime == "application/zip",
            Self::Xlsx => mime == XLSX_MIME || mime == "application/zip",
            // Any recognized binary signature means this is not text.
            Self::Csv => false,
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Render a path's extension for error messages (".xyz" or "(none)").
fn display_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_else(|| "(none)".to_string())
}

/// Check that `path` exists, carries the expected extension, is non-empty and
/// whose leading bytes look like `expected`. Plain-text formats only need to
/// not look like a known binary format.
pub fn validate_document(path: &Path, expected: DocumentFormat) -> Result<(), ExtractionError> {
    if !path.exists() {
        return Err(ExtractionError::NotFound(path.to_path_buf()));
    }

    if DocumentFormat::from_path(path) != Some(expected) {
        return Err(ExtractionError::Format(format!(
            "File is not {}: {}",
            expected.label(),
            display_extension(path)
        )));
    }

    // Read first 8KB for magic byte detection
    let mut file = File::open(path)?;
    let mut buffer = [0u8; 8192];
    let bytes_read = file.read(&mut buffer)?;

    if bytes_read == 0 {
        return Err(ExtractionError::Format(format!(
            "File is empty: {}",
            path.display()
        )));
    }

    match infer::get(&buffer[..bytes_read]) {
        Some(kind) if expected.accepts_mime(kind.mime_type()) => Ok(()),
        Some(kind) => Err(ExtractionError::Format(format!(
            "File content is not {} (detected {})",
            expected.label(),
            kind.mime_type()
        ))),
        None if expected.is_plain_text() => Ok(()),
        None => Err(ExtractionError::Format(format!(
            "File content is not {} (unrecognized content)",
            expected.label()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/report.PDF")),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes.docx")),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("data/rows.CSV")),
            Some(DocumentFormat::Csv)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("sheet.xlsx")),
            Some(DocumentFormat::Xlsx)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("macros.xlsm")),
            Some(DocumentFormat::Xlsx)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("legacy.xls")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("slides.pptx")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_validate_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = validate_document(&temp.path().join("gone.pdf"), DocumentFormat::Pdf)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NotFound(_)));
    }

    #[test]
    fn test_validate_wrong_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let err = validate_document(&path, DocumentFormat::Pdf).unwrap_err();
        assert!(matches!(err, ExtractionError::Format(_)));
        assert_eq!(err.to_string(), "File is not PDF: .txt");
    }

    #[test]
    fn test_validate_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();

        let err = validate_document(&path, DocumentFormat::Pdf).unwrap_err();
        assert!(matches!(err, ExtractionError::Format(_)));
        assert!(err.to_string().starts_with("File is empty"));
    }

    #[test]
    fn test_validate_mismatched_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fake.pdf");
        // PNG signature
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();

        let err = validate_document(&path, DocumentFormat::Pdf).unwrap_err();
        assert!(err.to_string().contains("detected image/png"));
    }

    #[test]
    fn test_validate_plain_text_renamed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("renamed.docx");
        std::fs::write(&path, b"just some text, not a zip").unwrap();

        let err = validate_document(&path, DocumentFormat::Docx).unwrap_err();
        assert!(matches!(err, ExtractionError::Format(_)));
    }

    #[test]
    fn test_validate_csv_has_no_magic() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rows.csv");
        std::fs::write(&path, b"a,b\n1,2\n").unwrap();
        assert!(validate_document(&path, DocumentFormat::Csv).is_ok());

        let pdf = temp.path().join("renamed.csv");
        std::fs::write(&pdf, b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n").unwrap();
        let err = validate_document(&pdf, DocumentFormat::Csv).unwrap_err();
        assert!(err.to_string().contains("detected application/pdf"));
    }

    #[test]
    fn test_validate_pdf_magic() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ok.pdf");
        std::fs::write(&path, b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n").unwrap();

        assert!(validate_document(&path, DocumentFormat::Pdf).is_ok());
    }
}
