//! JSON sidecar output, one file per successfully extracted document.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::labels::DocumentLabels;
use crate::models::{ExtractionMethod, ExtractionResult};

/// Errors that can occur while writing a sidecar.
#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("Refusing to save failed extraction of {source_file}: {message}")]
    FailedResult {
        source_file: String,
        message: String,
    },

    #[error("Sidecar {} already written for {existing}", .path.display())]
    Collision { path: PathBuf, existing: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Metadata block of a sidecar document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionInfo {
    pub success: bool,
    pub content_length: usize,
    pub method: ExtractionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    pub source_sha256: String,
    pub extracted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<DocumentLabels>,
}

/// On-disk sidecar document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidecarDocument {
    pub source_file: String,
    pub content: String,
    pub extraction_info: ExtractionInfo,
}

impl SidecarDocument {
    /// Build the sidecar for a successful result. `source_path` is hashed.
    pub fn from_result(
        result: &ExtractionResult,
        source_path: &Path,
    ) -> Result<Self, SidecarError> {
        if !result.is_success() {
            return Err(SidecarError::FailedResult {
                source_file: result.source_file().to_string(),
                message: result.error_message().unwrap_or_default().to_string(),
            });
        }

        Ok(Self {
            source_file: result.source_file().to_string(),
            content: result.content().to_string(),
            extraction_info: ExtractionInfo {
                success: true,
                content_length: result.content_length(),
                method: result.method().unwrap_or(ExtractionMethod::Native),
                quality_score: result.quality_score(),
                source_sha256: compute_file_hash(source_path)?,
                extracted_at: Utc::now(),
                labels: None,
            },
        })
    }

    pub fn with_labels(mut self, labels: Option<DocumentLabels>) -> Self {
        self.extraction_info.labels = labels;
        self
    }

    pub fn to_json(&self) -> Result<String, SidecarError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compute SHA-256 of a file, hex-encoded.
pub fn compute_file_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Writes sidecars into an output directory.
///
/// Clones share the set of sidecar paths already written, so two inputs
/// that would map to the same sidecar (e.g. `report.docx` and `report.DOCX`
/// on a case-insensitive file system) are caught instead of overwriting
/// each other.
#[derive(Debug, Clone)]
pub struct SidecarWriter {
    output_dir: PathBuf,
    input_root: Option<PathBuf>,
    claimed: Arc<Mutex<HashMap<String, PathBuf>>>,
}

impl SidecarWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            input_root: None,
            claimed: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Mirror the folder layout below `root` in the output directory.
    pub fn with_input_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.input_root = Some(root.into());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<output_dir>/[<dir below input root>/]<source file name>.json`
    pub fn sidecar_path(&self, source_path: &Path) -> PathBuf {
        let name = source_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        let relative_dir = self
            .input_root
            .as_deref()
            .and_then(|root| source_path.parent()?.strip_prefix(root).ok());

        match relative_dir {
            Some(dir) => self.output_dir.join(dir).join(format!("{}.json", name)),
            None => self.output_dir.join(format!("{}.json", name)),
        }
    }

    /// Reserve `path` for `source_path`. Paths are compared case-insensitively.
    fn claim(&self, path: &Path, source_path: &Path) -> Result<(), SidecarError> {
        let key = path.to_string_lossy().to_lowercase();
        let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());

        match claimed.get(&key) {
            Some(owner) if owner != source_path => Err(SidecarError::Collision {
                path: path.to_path_buf(),
                existing: owner.display().to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                claimed.insert(key, source_path.to_path_buf());
                Ok(())
            }
        }
    }

    /// Write the sidecar for `result`. Failed results are rejected.
    pub fn write(
        &self,
        result: &ExtractionResult,
        source_path: &Path,
        labels: Option<DocumentLabels>,
    ) -> Result<PathBuf, SidecarError> {
        let document = SidecarDocument::from_result(result, source_path)?.with_labels(labels);

        let path = self.sidecar_path(source_path);
        self.claim(&path, source_path)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, document.to_json()?)?;

        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_sidecar() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("relatório.pdf");
        fs::write(&source, b"%PDF-1.4 source bytes").unwrap();

        let result = ExtractionResult::success(
            "relatório.pdf",
            "Conteúdo extraído",
            ExtractionMethod::Ocr,
            Some(20),
        );
        let writer = SidecarWriter::new(temp.path().join("out/nested"));
        let path = writer.write(&result, &source, None).unwrap();

        assert_eq!(path, temp.path().join("out/nested/relatório.pdf.json"));
        let json = fs::read_to_string(&path).unwrap();
        // Non-ASCII is written as-is
        assert!(json.contains("Conteúdo extraído"));
        assert!(json.contains("\n  \"extraction_info\""));

        let document: SidecarDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(document.source_file, "relatório.pdf");
        assert_eq!(document.extraction_info.content_length, 17);
        assert_eq!(document.extraction_info.method, ExtractionMethod::Ocr);
        assert_eq!(document.extraction_info.quality_score, Some(20));
        assert_eq!(
            document.extraction_info.source_sha256,
            compute_file_hash(&source).unwrap()
        );
        assert!(document.extraction_info.labels.is_none());
        assert!(!json.contains("\"labels\""));
    }

    #[test]
    fn test_labels_written_and_layout_mirrored() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("raw");
        let source = root.join("LEGAL/CONTRACT/lease.pdf");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, b"%PDF-1.4 lease").unwrap();

        let labels = DocumentLabels {
            domain: "LEGAL".into(),
            category: "CONTRACT".into(),
            domain_description: "Domain containing 1 document categories".into(),
            category_description: "Signed agreements".into(),
        };
        let result = ExtractionResult::success("lease.pdf", "Lease terms", ExtractionMethod::Native, Some(90));
        let writer = SidecarWriter::new(temp.path().join("out")).with_input_root(&root);
        let path = writer.write(&result, &source, Some(labels.clone())).unwrap();

        assert_eq!(path, temp.path().join("out/LEGAL/CONTRACT/lease.pdf.json"));
        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"category_description\": \"Signed agreements\""));
        let document: SidecarDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(document.extraction_info.labels, Some(labels));
    }

    #[test]
    fn test_sidecar_names_keep_extension() {
        let writer = SidecarWriter::new("/out");
        assert_eq!(
            writer.sidecar_path(Path::new("/in/report.docx")),
            PathBuf::from("/out/report.docx.json")
        );
        assert_eq!(
            writer.sidecar_path(Path::new("/in/report.pdf")),
            PathBuf::from("/out/report.pdf.json")
        );
        // Outside the input root the layout is flat
        let writer = writer.with_input_root("/in");
        assert_eq!(
            writer.sidecar_path(Path::new("/elsewhere/a.pdf")),
            PathBuf::from("/out/a.pdf.json")
        );
    }

    #[test]
    fn test_case_colliding_sidecars_rejected() {
        let temp = TempDir::new().unwrap();
        let lower = temp.path().join("report.docx");
        let upper = temp.path().join("report.DOCX");
        fs::write(&lower, b"lower").unwrap();
        fs::write(&upper, b"upper").unwrap();

        let writer = SidecarWriter::new(temp.path().join("out"));
        let result = ExtractionResult::success("report.docx", "text", ExtractionMethod::Native, None);
        writer.write(&result, &lower, None).unwrap();
        // Rewriting the same source is not a collision
        writer.write(&result, &lower, None).unwrap();

        let err = writer.clone().write(&result, &upper, None).unwrap_err();
        assert!(matches!(err, SidecarError::Collision { .. }));
        let json = fs::read_to_string(temp.path().join("out/report.docx.json")).unwrap();
        let document: SidecarDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(
            document.extraction_info.source_sha256,
            compute_file_hash(&lower).unwrap()
        );
    }

    #[test]
    fn test_failed_result_not_written() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("broken.pdf");
        fs::write(&source, b"junk").unwrap();

        let result = ExtractionResult::failure("broken.pdf", "Cannot open document");
        let writer = SidecarWriter::new(temp.path().join("out"));
        let err = writer.write(&result, &source, None).unwrap_err();

        assert!(matches!(err, SidecarError::FailedResult { .. }));
        assert!(!temp.path().join("out/broken.pdf.json").exists());
    }

    #[test]
    fn test_compute_file_hash() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("abc.txt");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            compute_file_hash(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
