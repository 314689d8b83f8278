//! docsift - document text extraction with quality-gated OCR fallback.
//!
//! Extracts text from PDF, DOCX, CSV and Excel files, sampling the head and
//! tail of long documents, scores the result and falls back to OCR when the
//! native text of a PDF or DOCX looks unusable.

pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod quality;
pub mod services;

pub use extract::{DocumentFormat, ExtractionError};
pub use models::{ExtractionMethod, ExtractionResult};
pub use quality::{QualityAnalyzer, QualityMode, QualityScore};
pub use services::ExtractionOrchestrator;
