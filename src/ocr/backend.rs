//! OCR engine abstraction.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_OCR_MAX_PAGES: usize = 10;
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;
pub const DEFAULT_ENGINE_MODE: u8 = 3;
pub const DEFAULT_PAGE_SEG_MODE: u8 = 6;

/// Errors from OCR engines.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR unavailable: {0}")]
    Unavailable(String),

    #[error("OCR engine failure: {0}")]
    EngineFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// One recognized line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub text: String,
    /// Mean word confidence, 0.0 - 1.0.
    pub confidence: f32,
}

/// OCR configuration (languages, engine tuning, page policy).
#[derive(Debug, Clone, PartialEq)]
pub struct OcrConfig {
    /// Tesseract language codes, e.g. `["eng", "por"]`.
    pub languages: Vec<String>,
    /// Tesseract `--oem`.
    pub engine_mode: u8,
    /// Tesseract `--psm`.
    pub page_seg_mode: u8,
    /// PDF pages OCR'd at most.
    pub max_pages: usize,
    /// Render scale relative to 72 DPI.
    pub render_scale: f32,
    /// Regions below this confidence are dropped.
    pub min_confidence: f32,
    /// Parent directory for per-call scratch directories (system temp if unset).
    pub scratch_dir: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: vec!["eng".to_string(), "por".to_string()],
            engine_mode: DEFAULT_ENGINE_MODE,
            page_seg_mode: DEFAULT_PAGE_SEG_MODE,
            max_pages: DEFAULT_OCR_MAX_PAGES,
            render_scale: DEFAULT_RENDER_SCALE,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            scratch_dir: None,
        }
    }
}

impl OcrConfig {
    /// Render resolution passed to `pdftoppm`.
    pub fn render_dpi(&self) -> u32 {
        (72.0 * self.render_scale).round().max(1.0) as u32
    }
}

/// An initialized OCR engine.
pub trait OcrBackend: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Languages the engine will recognize, `+`-joined.
    fn languages(&self) -> String;

    /// Recognize the text lines in an image.
    fn recognize(&self, image_path: &Path) -> Result<Vec<TextRegion>, OcrError>;
}

/// Keep confident regions and join them one per line.
pub fn regions_to_text(regions: &[TextRegion], min_confidence: f32) -> String {
    regions
        .iter()
        .filter(|r| r.confidence >= min_confidence)
        .map(|r| r.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(text: &str, confidence: f32) -> TextRegion {
        TextRegion {
            text: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_low_confidence_regions_dropped() {
        let regions = vec![
            region("MEMORANDUM", 0.93),
            region("~~//..", 0.21),
            region("To: All staff", 0.5),
            region("   ", 0.99),
        ];
        assert_eq!(regions_to_text(&regions, 0.5), "MEMORANDUM\nTo: All staff");
    }

    #[test]
    fn test_render_dpi() {
        assert_eq!(OcrConfig::default().render_dpi(), 144);
        let config = OcrConfig {
            render_scale: 4.17,
            ..OcrConfig::default()
        };
        assert_eq!(config.render_dpi(), 300);
    }
}
