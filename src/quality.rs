//! Extraction quality scoring.
//!
//! Native text extraction fails quietly: scanned PDFs yield nothing, broken
//! font encodings yield `(cid:NN)` soup or replacement characters, and some
//! generators lay text out one glyph per line. [`QualityAnalyzer`] turns those
//! signals into a 0-100 score; anything strictly below the threshold is a
//! candidate for OCR.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUALITY_THRESHOLD: u8 = 60;

/// Score assigned to text shorter than the minimum length, at most.
const SHORT_TEXT_CAP: f64 = 30.0;

const REPLACEMENT_PENALTY: f64 = 45.0;
const CONTROL_PENALTY: f64 = 30.0;
const FEW_WORDS_PENALTY: f64 = 45.0;
const GLYPH_REFERENCE_PENALTY: f64 = 45.0;
const GARBLED_PENALTY: f64 = 45.0;
const REPETITION_PENALTY: f64 = 30.0;
const RECOGNIZABLE_BASE_PENALTY: f64 = 25.0;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));
static CID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(cid:\d+\)").expect("valid regex"));

/// Typographic punctuation that shows up in clean text but is not ASCII.
const TYPOGRAPHIC: &[char] = &[
    '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2013}', '\u{2014}', '\u{2026}',
    '\u{2022}', '\u{00B7}', '\u{00A7}', '\u{00B0}', '\u{00AB}', '\u{00BB}', '\u{20AC}',
    '\u{00A3}', '\u{00A0}', '\u{00BA}', '\u{00AA}',
];

/// How text is scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityMode {
    /// Full heuristic analysis.
    #[default]
    Heuristic,
    /// Length check only: empty or shorter than the minimum length scores 0,
    /// everything else 100.
    Minimal,
}

impl QualityMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "heuristic" => Some(Self::Heuristic),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }
}

impl prefer::FromValue for QualityMode {
    fn from_value(value: &prefer::ConfigValue) -> prefer::Result<Self> {
        match value.as_str() {
            Some(s) => Self::from_str(s).ok_or_else(|| prefer::Error::ConversionError {
                key: String::new(),
                type_name: "QualityMode".to_string(),
                source: format!("unknown quality mode: {}", s).into(),
            }),
            None => Err(prefer::Error::ConversionError {
                key: String::new(),
                type_name: "QualityMode".to_string(),
                source: "expected string".into(),
            }),
        }
    }
}

/// A reason the text scored lower.
#[derive(Debug, Clone, PartialEq)]
pub enum QualityIssue {
    Empty,
    TooShort { chars: usize },
    ReplacementChars { count: usize },
    LowRecognizableRatio { ratio: f64 },
    ControlChars { count: usize },
    FewWords { count: usize },
    GlyphReferences { count: usize },
    GarbledStructure,
    Repetition { word: String },
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "no text"),
            Self::TooShort { chars } => write!(f, "too short ({} chars)", chars),
            Self::ReplacementChars { count } => {
                write!(f, "{} replacement characters", count)
            }
            Self::LowRecognizableRatio { ratio } => {
                write!(f, "only {:.0}% recognizable characters", ratio * 100.0)
            }
            Self::ControlChars { count } => write!(f, "{} control characters", count),
            Self::FewWords { count } => write!(f, "only {} words", count),
            Self::GlyphReferences { count } => {
                write!(f, "{} unmapped glyph references", count)
            }
            Self::GarbledStructure => write!(f, "garbled line structure"),
            Self::Repetition { word } => write!(f, "excessive repetition of {:?}", word),
        }
    }
}

/// Result of scoring one text.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityScore {
    value: u8,
    threshold: u8,
    issues: Vec<QualityIssue>,
}

impl QualityScore {
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn issues(&self) -> &[QualityIssue] {
        &self.issues
    }

    /// Strictly below the threshold.
    pub fn is_low(&self) -> bool {
        self.value < self.threshold
    }
}

/// Limits used by the heuristic scorer.
#[derive(Debug, Clone)]
pub struct QualityLimits {
    pub min_text_length: usize,
    pub max_replacement_chars: usize,
    pub max_replacement_ratio: f64,
    pub min_word_count: usize,
    pub min_recognizable_ratio: f64,
}

impl Default for QualityLimits {
    fn default() -> Self {
        Self {
            min_text_length: 50,
            max_replacement_chars: 5,
            max_replacement_ratio: 0.01,
            min_word_count: 10,
            min_recognizable_ratio: 0.8,
        }
    }
}

/// Scores text for extraction adequacy. Format-agnostic.
#[derive(Debug, Clone)]
pub struct QualityAnalyzer {
    mode: QualityMode,
    threshold: u8,
    limits: QualityLimits,
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self::new(QualityMode::Heuristic, DEFAULT_QUALITY_THRESHOLD)
    }
}

impl QualityAnalyzer {
    pub fn new(mode: QualityMode, threshold: u8) -> Self {
        Self {
            mode,
            threshold,
            limits: QualityLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: QualityLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Whether `text` scores below the threshold.
    pub fn needs_ocr(&self, text: &str) -> bool {
        self.score(text).is_low()
    }

    pub fn score(&self, text: &str) -> QualityScore {
        let trimmed = text.trim();
        let (value, issues) = if trimmed.is_empty() {
            (0, vec![QualityIssue::Empty])
        } else {
            match self.mode {
                QualityMode::Minimal => self.score_minimal(trimmed),
                QualityMode::Heuristic => self.score_heuristic(trimmed),
            }
        };

        QualityScore {
            value,
            threshold: self.threshold,
            issues,
        }
    }

    fn score_minimal(&self, text: &str) -> (u8, Vec<QualityIssue>) {
        let chars = text.chars().count();
        if chars < self.limits.min_text_length {
            (0, vec![QualityIssue::TooShort { chars }])
        } else {
            (100, Vec::new())
        }
    }

    fn score_heuristic(&self, text: &str) -> (u8, Vec<QualityIssue>) {
        let limits = &self.limits;
        let mut issues = Vec::new();
        let mut score = 100.0_f64;

        let total = text.chars().count();
        let mut replacement = 0usize;
        let mut control = 0usize;
        let mut recognizable = 0usize;
        for c in text.chars() {
            if c == '\u{FFFD}' {
                replacement += 1;
            } else if c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c') {
                control += 1;
            } else if c.is_alphanumeric()
                || c.is_whitespace()
                || c.is_ascii_punctuation()
                || TYPOGRAPHIC.contains(&c)
            {
                recognizable += 1;
            }
        }

        if replacement > limits.max_replacement_chars
            || replacement as f64 / total as f64 > limits.max_replacement_ratio
        {
            score -= REPLACEMENT_PENALTY;
            issues.push(QualityIssue::ReplacementChars { count: replacement });
        }

        if control > limits.max_replacement_chars
            || control as f64 / total as f64 > limits.max_replacement_ratio
        {
            score -= CONTROL_PENALTY;
            issues.push(QualityIssue::ControlChars { count: control });
        }

        let ratio = recognizable as f64 / total as f64;
        if ratio < limits.min_recognizable_ratio {
            score -= RECOGNIZABLE_BASE_PENALTY + (limits.min_recognizable_ratio - ratio) * 100.0;
            issues.push(QualityIssue::LowRecognizableRatio { ratio });
        }

        let words: Vec<&str> = WORD_RE.find_iter(text).map(|m| m.as_str()).collect();
        if words.len() < limits.min_word_count {
            score -= FEW_WORDS_PENALTY;
            issues.push(QualityIssue::FewWords { count: words.len() });
        }

        let glyph_refs = CID_RE.find_iter(text).count();
        if glyph_refs >= 3 || text.contains("Identity-H Unimplemented") {
            score -= GLYPH_REFERENCE_PENALTY;
            issues.push(QualityIssue::GlyphReferences { count: glyph_refs });
        }

        if is_garbled(text) {
            score -= GARBLED_PENALTY;
            issues.push(QualityIssue::GarbledStructure);
        }

        if let Some(word) = dominant_word(&words) {
            score -= REPETITION_PENALTY;
            issues.push(QualityIssue::Repetition { word });
        }

        if total < limits.min_text_length {
            score = score.min(SHORT_TEXT_CAP);
            issues.push(QualityIssue::TooShort { chars: total });
        }

        (score.clamp(0.0, 100.0).round() as u8, issues)
    }
}

/// One glyph per line, or letter-spaced words ("T h i s  i s").
fn is_garbled(text: &str) -> bool {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() >= 10 {
        let short = lines.iter().filter(|l| l.chars().count() <= 2).count();
        if short * 2 > lines.len() {
            return true;
        }
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() >= 20 {
        let single = tokens
            .iter()
            .filter(|t| {
                let mut chars = t.chars();
                matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
            })
            .count();
        if single * 2 > tokens.len() {
            return true;
        }
    }

    false
}

/// A single word making up more than a third of a 100+ word sample.
fn dominant_word(words: &[&str]) -> Option<String> {
    let sample = &words[..words.len().min(1000)];
    if sample.len() < 100 {
        return None;
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in sample {
        *counts.entry(word.to_lowercase()).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .filter(|(_, count)| *count * 3 > sample.len())
        .map(|(word, _)| word)
}
