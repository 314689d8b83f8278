//! OCR fallback for documents whose native text is unusable.
//!
//! - PDF pages are rendered with `pdftoppm` ([`PopplerRenderer`]) and
//!   recognized one at a time
//! - DOCX embedded images under `word/media/` are recognized individually
//!
//! Tesseract is the engine; it sits behind [`OcrBackend`] and page rendering
//! behind [`PageRenderer`], so the provider can be driven by other engines
//! (and by fakes in tests).

mod archive;
mod backend;
mod model_utils;
mod pdf_utils;
mod provider;
mod tesseract;

pub use backend::{
    regions_to_text, OcrBackend, OcrConfig, OcrError, TextRegion, DEFAULT_ENGINE_MODE,
    DEFAULT_MIN_CONFIDENCE, DEFAULT_OCR_MAX_PAGES, DEFAULT_PAGE_SEG_MODE, DEFAULT_RENDER_SCALE,
};
pub use model_utils::{check_binary, check_tools, REQUIRED_TOOLS};
pub use pdf_utils::{PageRenderer, PopplerRenderer};
pub use provider::{EngineOcrProvider, OcrProvider};
pub use tesseract::{list_installed_languages, TesseractBackend};
