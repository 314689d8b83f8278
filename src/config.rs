//! Configuration management for docsift using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::extract::docx::{DOCX_SAMPLE_SIZE, DOCX_SAMPLING_THRESHOLD};
use crate::extract::pdf::{PDF_SAMPLE_SIZE, PDF_SAMPLING_THRESHOLD};
use crate::extract::{
    ReaderLimits, SamplingPolicy, DOCX_OMISSION_MARKER, PDF_OMISSION_MARKER, TABLE_MAX_CHARS,
};
use crate::ocr::OcrConfig;
use crate::quality::{QualityMode, DEFAULT_QUALITY_THRESHOLD};

/// Default number of documents processed concurrently.
pub const DEFAULT_WORKERS: usize = 4;

const INPUT_SUBDIR: &str = "input";
const OUTPUT_SUBDIR: &str = "output";

/// Sampling threshold and sample size for one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSettings {
    pub threshold: usize,
    pub sample_size: usize,
}

/// Everything the extraction pipeline needs. Read-only once built.
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub ocr_enabled: bool,
    pub quality_threshold: u8,
    pub quality_mode: QualityMode,
    pub pdf: SamplingSettings,
    pub docx: SamplingSettings,
    /// Character budget for CSV and spreadsheet rows.
    pub table_max_chars: usize,
    pub ocr: OcrConfig,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            ocr_enabled: true,
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            quality_mode: QualityMode::default(),
            pdf: SamplingSettings {
                threshold: PDF_SAMPLING_THRESHOLD,
                sample_size: PDF_SAMPLE_SIZE,
            },
            docx: SamplingSettings {
                threshold: DOCX_SAMPLING_THRESHOLD,
                sample_size: DOCX_SAMPLE_SIZE,
            },
            table_max_chars: TABLE_MAX_CHARS,
            ocr: OcrConfig::default(),
        }
    }
}

impl ExtractionSettings {
    pub fn pdf_policy(&self) -> SamplingPolicy {
        SamplingPolicy::new(self.pdf.threshold, self.pdf.sample_size, PDF_OMISSION_MARKER)
    }

    pub fn docx_policy(&self) -> SamplingPolicy {
        SamplingPolicy::new(
            self.docx.threshold,
            self.docx.sample_size,
            DOCX_OMISSION_MARKER,
        )
    }

    pub fn reader_limits(&self) -> ReaderLimits {
        ReaderLimits {
            pdf: self.pdf_policy(),
            docx: self.docx_policy(),
            table_max_chars: self.table_max_chars,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory scanned by `batch` when no directory is given.
    pub input_dir: PathBuf,
    /// Directory sidecar JSON files are written to.
    pub output_dir: PathBuf,
    /// Documents processed concurrently.
    pub workers: usize,
    /// Domain/category structure; when set, `batch` crawls
    /// `<input>/<DOMAIN>/<CATEGORY>/` and labels sidecars.
    pub label_structure: Option<PathBuf>,
    pub extraction: ExtractionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Documents/docsift/
        // Falls back gracefully: Documents dir -> Home dir -> Current dir
        let base_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docsift");

        Self {
            input_dir: base_dir.join(INPUT_SUBDIR),
            output_dir: base_dir.join(OUTPUT_SUBDIR),
            workers: DEFAULT_WORKERS,
            label_structure: None,
            extraction: ExtractionSettings::default(),
        }
    }
}

/// Configuration file structure. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<u64>,
    /// JSON file mapping domains to their categories and descriptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_structure: Option<String>,
    /// Parent directory for OCR scratch space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_threshold: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_mode: Option<QualityMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_sampling_threshold: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_sample_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docx_sampling_threshold: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docx_sample_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_max_chars: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_max_pages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_render_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_min_confidence: Option<f64>,
    /// Tesseract language codes, e.g. `["eng", "por"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_engine_mode: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_page_seg_mode: Option<u64>,

    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers docsift config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("docsift").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref dir) = self.input_dir {
            settings.input_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(ref dir) = self.output_dir {
            settings.output_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(workers) = self.workers {
            settings.workers = (workers as usize).max(1);
        }
        if let Some(ref path) = self.label_structure {
            settings.label_structure = Some(self.resolve_path(path, base_dir));
        }

        let extraction = &mut settings.extraction;
        if let Some(enabled) = self.ocr_enabled {
            extraction.ocr_enabled = enabled;
        }
        if let Some(threshold) = self.quality_threshold {
            if threshold > 100 {
                tracing::warn!("quality_threshold {} exceeds 100, using 100", threshold);
            }
            extraction.quality_threshold = threshold.min(100) as u8;
        }
        if let Some(mode) = self.quality_mode {
            extraction.quality_mode = mode;
        }

        if let Some(threshold) = self.pdf_sampling_threshold {
            extraction.pdf.threshold = threshold as usize;
        }
        if let Some(size) = self.pdf_sample_size {
            extraction.pdf.sample_size = size as usize;
        }
        if let Some(threshold) = self.docx_sampling_threshold {
            extraction.docx.threshold = threshold as usize;
        }
        if let Some(size) = self.docx_sample_size {
            extraction.docx.sample_size = size as usize;
        }
        if let Some(max_chars) = self.table_max_chars {
            extraction.table_max_chars = max_chars as usize;
        }

        let ocr = &mut extraction.ocr;
        if let Some(ref dir) = self.scratch_dir {
            ocr.scratch_dir = Some(self.resolve_path(dir, base_dir));
        }
        if let Some(max_pages) = self.ocr_max_pages {
            ocr.max_pages = max_pages as usize;
        }
        if let Some(scale) = self.ocr_render_scale {
            ocr.render_scale = scale as f32;
        }
        if let Some(confidence) = self.ocr_min_confidence {
            ocr.min_confidence = confidence as f32;
        }
        if let Some(ref languages) = self.ocr_languages {
            ocr.languages = languages.clone();
        }
        if let Some(mode) = self.ocr_engine_mode {
            ocr.engine_mode = mode.min(u8::MAX as u64) as u8;
        }
        if let Some(mode) = self.ocr_page_seg_mode {
            ocr.page_seg_mode = mode.min(u8::MAX as u64) as u8;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
}

/// Load config from file sources.
async fn load_file_config(options: &LoadOptions) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return match Config::load_from_path(config_path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}", e);
                Config::default()
            }
        };
    }

    // Priority 2: Auto-discover via prefer
    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = load_file_config(&options).await;

    let mut settings = Settings::default();

    // Determine base directory for resolving relative paths
    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    (settings, config)
}
