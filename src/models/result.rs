//! Per-document extraction outcome.
//!
//! An `ExtractionResult` is either a success carrying the final text or a
//! failure carrying a human-readable message. The fields are private so the
//! success/failure invariant can only be established by the constructors.

use serde::{Deserialize, Serialize};

/// Which candidate produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Text from the document's own text layer / XML.
    Native,
    /// Text recognized by the OCR engine.
    Ocr,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Ocr => "ocr",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of running one document through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    source_file: String,
    content: String,
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<ExtractionMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quality_score: Option<u8>,
}

impl ExtractionResult {
    /// Successful extraction.
    ///
    /// Empty content is not accepted here; it is turned into a failure so an
    /// empty document can never pass for a successful one by accident. Use
    /// [`ExtractionResult::empty`] when an empty document is expected.
    pub fn success(
        source_file: impl Into<String>,
        content: impl Into<String>,
        method: ExtractionMethod,
        quality_score: Option<u8>,
    ) -> Self {
        let source_file = source_file.into();
        let content = content.into();
        if content.is_empty() {
            return Self::failure(source_file, "Empty content despite success status");
        }
        Self {
            source_file,
            content,
            success: true,
            error_message: None,
            method: Some(method),
            quality_score,
        }
    }

    /// Successful extraction of a document that has no text at all.
    pub fn empty(
        source_file: impl Into<String>,
        method: ExtractionMethod,
        quality_score: Option<u8>,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            content: String::new(),
            success: true,
            error_message: None,
            method: Some(method),
            quality_score,
        }
    }

    /// Failed extraction.
    pub fn failure(source_file: impl Into<String>, error_message: impl Into<String>) -> Self {
        let mut error_message = error_message.into();
        if error_message.trim().is_empty() {
            error_message = "Unknown extraction error".to_string();
        }
        Self {
            source_file: source_file.into(),
            content: String::new(),
            success: false,
            error_message: Some(error_message),
            method: None,
            quality_score: None,
        }
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn method(&self) -> Option<ExtractionMethod> {
        self.method
    }

    /// Quality score of the native candidate (0-100).
    pub fn quality_score(&self) -> Option<u8> {
        self.quality_score
    }

    /// Content length in characters.
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }
}
