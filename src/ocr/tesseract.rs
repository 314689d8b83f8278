//! Tesseract OCR backend.
//!
//! Runs the `tesseract` CLI with TSV output so each recognized line carries
//! a confidence.

use std::path::Path;
use std::process::Command;

use super::backend::{OcrBackend, OcrConfig, OcrError, TextRegion};
use super::model_utils::{check_binary, TESSERACT_NOT_FOUND};

/// Tesseract OCR backend.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    languages: String,
    engine_mode: u8,
    page_seg_mode: u8,
}

impl TesseractBackend {
    /// Verify tesseract is installed and narrow the configured languages to
    /// the installed language packs. Page rendering tools are checked by the
    /// PDF route, not here.
    pub fn initialize(config: &OcrConfig) -> Result<Self, OcrError> {
        if !check_binary("tesseract") {
            return Err(OcrError::Unavailable(TESSERACT_NOT_FOUND.to_string()));
        }

        let installed = list_installed_languages()?;
        let languages = narrow_languages(&config.languages, &installed);
        if languages.is_empty() {
            return Err(OcrError::Unavailable(format!(
                "none of the configured languages ({}) are installed",
                config.languages.join("+")
            )));
        }

        let dropped: Vec<_> = config
            .languages
            .iter()
            .filter(|l| !languages.contains(l))
            .collect();
        if !dropped.is_empty() {
            tracing::warn!("Tesseract language packs not installed: {:?}", dropped);
        }

        tracing::info!("Tesseract ready with languages {}", languages.join("+"));
        Ok(Self {
            languages: languages.join("+"),
            engine_mode: config.engine_mode,
            page_seg_mode: config.page_seg_mode,
        })
    }

    fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let oem = self.engine_mode.to_string();
        let psm = self.page_seg_mode.to_string();
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.languages, "--oem", &oem, "--psm", &psm])
            .arg("tsv")
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::EngineFailure(format!(
                        "tesseract failed: {}",
                        stderr.trim()
                    )))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::Unavailable(TESSERACT_NOT_FOUND.to_string()))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn languages(&self) -> String {
        self.languages.clone()
    }

    fn recognize(&self, image_path: &Path) -> Result<Vec<TextRegion>, OcrError> {
        let tsv = self.run_tesseract(image_path)?;
        Ok(parse_tsv(&tsv))
    }
}

/// Installed language packs, from `tesseract --list-langs`.
pub fn list_installed_languages() -> Result<Vec<String>, OcrError> {
    let output = Command::new("tesseract")
        .arg("--list-langs")
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                OcrError::Unavailable(TESSERACT_NOT_FOUND.to_string())
            }
            _ => OcrError::Io(e),
        })?;

    // Older releases print the list on stderr
    let mut listing = String::from_utf8_lossy(&output.stdout).to_string();
    listing.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(parse_language_list(&listing))
}

fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("List of") && !l.contains(' '))
        .map(str::to_string)
        .collect()
}

/// Configured languages that are installed, in configured order.
fn narrow_languages(configured: &[String], installed: &[String]) -> Vec<String> {
    configured
        .iter()
        .filter(|l| installed.contains(l))
        .cloned()
        .collect()
}

/// Group TSV word rows into line regions.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Word rows have level 5; rows with
/// negative confidence carry no text.
pub fn parse_tsv(tsv: &str) -> Vec<TextRegion> {
    let mut regions = Vec::new();
    let mut current_key: Option<(u32, u32, u32, u32)> = None;
    let mut words: Vec<String> = Vec::new();
    let mut confidences: Vec<f32> = Vec::new();

    let mut flush = |words: &mut Vec<String>, confidences: &mut Vec<f32>| {
        if !words.is_empty() {
            let mean = confidences.iter().sum::<f32>() / confidences.len() as f32;
            regions.push(TextRegion {
                text: words.join(" "),
                confidence: (mean / 100.0).clamp(0.0, 1.0),
            });
        }
        words.clear();
        confidences.clear();
    };

    for line in tsv.lines().skip(1) {
        let cols: Vec<&str> = line.splitn(12, '\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let Ok(conf) = cols[10].parse::<f32>() else {
            continue;
        };
        let text = cols[11].trim();
        if conf < 0.0 || text.is_empty() {
            continue;
        }

        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        if current_key != Some(key) {
            flush(&mut words, &mut confidences);
            current_key = Some(key);
        }
        words.push(text.to_string());
        confidences.push(conf);
    }
    flush(&mut words, &mut confidences);

    regions
}
