//! Batch service types and events.

use std::time::Duration;

use crate::models::ExtractionMethod;

/// Events emitted during batch processing.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Batch started
    Started { total_documents: usize },
    /// Document processing started
    DocumentStarted { source_file: String },
    /// Document extracted (and its sidecar written, if enabled)
    DocumentCompleted {
        source_file: String,
        method: ExtractionMethod,
        content_length: usize,
    },
    /// Document extraction failed
    DocumentFailed { source_file: String, error: String },
    /// Extraction succeeded but the sidecar could not be written
    SidecarFailed { source_file: String, error: String },
    /// Batch complete
    Finished {
        succeeded: usize,
        failed: usize,
        ocr_improved: usize,
    },
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Successful documents whose final text came from OCR.
    pub ocr_improved: usize,
    /// `(source_file, error)` for every failure, in input order.
    pub failures: Vec<(String, String)>,
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Percentage of documents that succeeded (0 for an empty batch).
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total as f64 * 100.0
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
