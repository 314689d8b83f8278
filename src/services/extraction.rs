//! Extraction pipeline for a single document.
//!
//! Native extraction, quality check, optional OCR, then arbitration between
//! the two candidates. [`ExtractionOrchestrator::run`] never fails: every
//! error (and any panic in a collaborator) becomes a failed
//! [`ExtractionResult`].

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use crate::config::ExtractionSettings;
use crate::extract::{reader_for, DocumentFormat, DocumentReader, ExtractionError};
use crate::models::{ExtractionMethod, ExtractionResult};
use crate::ocr::{EngineOcrProvider, OcrProvider};
use crate::quality::QualityAnalyzer;

/// Pipeline stages, logged as the document moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Extracted,
    QualityChecked,
    OcrApplied,
    Skipped,
    Arbitrated,
    Done,
    Failed,
}

/// Pick the candidate with more text.
///
/// OCR wins only when its trimmed character count is strictly greater than
/// the original's; ties keep the original.
pub fn arbitrate(original: String, ocr: String) -> (String, ExtractionMethod) {
    let original_len = original.trim().chars().count();
    let ocr_len = ocr.trim().chars().count();

    if ocr_len > original_len {
        (ocr, ExtractionMethod::Ocr)
    } else {
        (original, ExtractionMethod::Native)
    }
}

/// File name used as `source_file` in results.
pub(crate) fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs documents through extraction, quality scoring and OCR fallback.
pub struct ExtractionOrchestrator {
    readers: HashMap<DocumentFormat, Box<dyn DocumentReader>>,
    analyzer: QualityAnalyzer,
    ocr: Arc<dyn OcrProvider>,
    ocr_enabled: bool,
    ocr_max_pages: usize,
}

impl ExtractionOrchestrator {
    /// Orchestrator with the default readers and the Tesseract OCR provider.
    pub fn new(settings: &ExtractionSettings) -> Self {
        let ocr = Arc::new(EngineOcrProvider::new(settings.ocr.clone()));
        Self::with_ocr_provider(settings, ocr)
    }

    /// Orchestrator with the default readers and a custom OCR provider.
    pub fn with_ocr_provider(settings: &ExtractionSettings, ocr: Arc<dyn OcrProvider>) -> Self {
        let limits = settings.reader_limits();
        let mut readers = HashMap::new();
        for format in [
            DocumentFormat::Pdf,
            DocumentFormat::Docx,
            DocumentFormat::Csv,
            DocumentFormat::Xlsx,
        ] {
            readers.insert(format, reader_for(format, &limits));
        }

        Self {
            readers,
            analyzer: QualityAnalyzer::new(settings.quality_mode, settings.quality_threshold),
            ocr,
            ocr_enabled: settings.ocr_enabled,
            ocr_max_pages: settings.ocr.max_pages,
        }
    }

    /// Replace the reader for the reader's format.
    pub fn with_reader(mut self, reader: Box<dyn DocumentReader>) -> Self {
        self.readers.insert(reader.format(), reader);
        self
    }

    pub fn ocr_provider(&self) -> &Arc<dyn OcrProvider> {
        &self.ocr
    }

    pub fn ocr_enabled(&self) -> bool {
        self.ocr_enabled
    }

    /// Process one document.
    pub fn run(&self, path: &Path) -> ExtractionResult {
        let source_file = source_name(path);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(path, &source_file)));

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                self.transition(&source_file, PipelineState::Failed);
                tracing::warn!("Extraction failed for {}: {}", path.display(), e);
                ExtractionResult::failure(source_file, e.to_string())
            }
            Err(payload) => {
                self.transition(&source_file, PipelineState::Failed);
                let message = panic_message(payload.as_ref());
                tracing::error!("Extraction panicked for {}: {}", path.display(), message);
                ExtractionResult::failure(
                    source_file,
                    format!("Internal error during extraction: {}", message),
                )
            }
        }
    }

    fn execute(&self, path: &Path, source_file: &str) -> Result<ExtractionResult, ExtractionError> {
        self.transition(source_file, PipelineState::Start);

        if !path.exists() {
            return Err(ExtractionError::NotFound(path.to_path_buf()));
        }

        let (format, reader) = DocumentFormat::from_path(path)
            .and_then(|format| Some((format, self.readers.get(&format)?)))
            .ok_or_else(|| {
                ExtractionError::Format(format!(
                    "Unsupported file type: {}",
                    path.extension()
                        .map(|e| format!(".{}", e.to_string_lossy()))
                        .unwrap_or_else(|| "(no extension)".to_string())
                ))
            })?;

        let original = reader.extract(path)?;
        self.transition(source_file, PipelineState::Extracted);

        let score = self.analyzer.score(&original);
        self.transition(source_file, PipelineState::QualityChecked);
        if score.is_low() {
            let issues: Vec<String> = score.issues().iter().map(|i| i.to_string()).collect();
            tracing::info!(
                "{}: quality {} below {} ({})",
                source_file,
                score.value(),
                score.threshold(),
                issues.join(", ")
            );
        }

        // Tables have no pages or images to recognize.
        let try_ocr = score.is_low() && format.supports_ocr() && self.ocr_enabled;
        let (content, method) = if try_ocr && self.ocr.available() {
            self.transition(source_file, PipelineState::OcrApplied);
            let ocr_text = self.ocr.extract(path, self.ocr_max_pages);
            arbitrate(original, ocr_text)
        } else {
            self.transition(source_file, PipelineState::Skipped);
            (original, ExtractionMethod::Native)
        };
        self.transition(source_file, PipelineState::Arbitrated);

        if method == ExtractionMethod::Ocr {
            tracing::info!("{}: OCR text replaced native text", source_file);
        }

        let result = if content.is_empty() {
            ExtractionResult::empty(source_file, method, Some(score.value()))
        } else {
            ExtractionResult::success(source_file, content, method, Some(score.value()))
        };
        self.transition(source_file, PipelineState::Done);

        Ok(result)
    }

    fn transition(&self, source_file: &str, state: PipelineState) {
        tracing::debug!("{}: {:?}", source_file, state);
    }
}
