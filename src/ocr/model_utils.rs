//! Shared helpers for locating OCR and Poppler tools.

use std::path::PathBuf;

pub const TESSERACT_NOT_FOUND: &str = "tesseract not found (install tesseract-ocr)";
pub const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";

/// Tools the pipeline shells out to.
pub const REQUIRED_TOOLS: [&str; 4] = ["pdfinfo", "pdftotext", "pdftoppm", "tesseract"];

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Full path of a binary, if installed.
pub fn locate_binary(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Availability of every required tool.
pub fn check_tools() -> Vec<(&'static str, Option<PathBuf>)> {
    REQUIRED_TOOLS
        .iter()
        .map(|tool| (*tool, locate_binary(tool)))
        .collect()
}
