//! PDF-to-image conversion for OCR.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::backend::OcrError;
use super::model_utils::PDFTOPPM_NOT_FOUND;
use crate::extract::pdf::pdf_page_count;
use crate::extract::ExtractionError;

/// Turns PDF pages into images an OCR engine can read.
pub trait PageRenderer: Send + Sync {
    /// Number of pages in the PDF.
    fn page_count(&self, pdf_path: &Path) -> Result<usize, OcrError>;

    /// Render one (1-based) page into `output_dir`, returning the image path.
    fn render_page(
        &self,
        pdf_path: &Path,
        page: usize,
        dpi: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, OcrError>;
}

/// Poppler's `pdfinfo` for page counts and `pdftoppm` for rendering.
///
/// A missing tool surfaces as [`OcrError::Unavailable`] only when a PDF is
/// actually OCR'd, so image OCR keeps working without Poppler.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopplerRenderer;

impl PageRenderer for PopplerRenderer {
    fn page_count(&self, pdf_path: &Path) -> Result<usize, OcrError> {
        pdf_page_count(pdf_path).map_err(|e| match e {
            ExtractionError::ToolNotFound(tool) => OcrError::Unavailable(tool),
            other => OcrError::EngineFailure(other.to_string()),
        })
    }

    fn render_page(
        &self,
        pdf_path: &Path,
        page: usize,
        dpi: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, OcrError> {
        pdf_page_to_image(pdf_path, page, dpi, output_dir)
    }
}

/// Render one (1-based) PDF page to a PNG in `output_dir` using pdftoppm.
pub fn pdf_page_to_image(
    pdf_path: &Path,
    page: usize,
    dpi: u32,
    output_dir: &Path,
) -> Result<PathBuf, OcrError> {
    let page_str = page.to_string();
    let dpi_str = dpi.to_string();
    let output_prefix = output_dir.join(format!("page-{}", page));

    let output = Command::new("pdftoppm")
        .args(["-png", "-singlefile", "-r", &dpi_str])
        .args(["-f", &page_str, "-l", &page_str])
        .arg(pdf_path)
        .arg(&output_prefix)
        .output();

    match output {
        Ok(o) if o.status.success() => find_page_image(output_dir, page).ok_or_else(|| {
            OcrError::EngineFailure(format!("No image generated for page {}", page))
        }),
        Ok(o) => Err(OcrError::EngineFailure(format!(
            "pdftoppm failed on page {}: {}",
            page,
            String::from_utf8_lossy(&o.stderr).trim()
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(OcrError::Unavailable(PDFTOPPM_NOT_FOUND.to_string()))
        }
        Err(e) => Err(OcrError::Io(e)),
    }
}

/// Find the image file rendered for a page.
///
/// With `-singlefile` pdftoppm writes `page-N.png`; older builds ignore the
/// flag and append a zero-padded page number instead.
pub fn find_page_image(dir: &Path, page: usize) -> Option<PathBuf> {
    let single = dir.join(format!("page-{}.png", page));
    if single.exists() {
        return Some(single);
    }
    for digits in [1, 2, 3, 4] {
        let filename = format!("page-{}-{:0width$}.png", page, page, width = digits);
        let path = dir.join(&filename);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_page_image_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(find_page_image(temp.path(), 1).is_none());
    }

    #[test]
    fn test_find_page_image_singlefile() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page-3.png");
        std::fs::write(&path, b"fake png").unwrap();

        assert_eq!(find_page_image(temp.path(), 3), Some(path));
    }

    #[test]
    fn test_find_page_image_with_padding() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page-7-007.png");
        std::fs::write(&path, b"fake png").unwrap();

        assert_eq!(find_page_image(temp.path(), 7), Some(path));
    }
}
