//! Configuration for transcription runs.
//!
//! Settings are an immutable snapshot per extraction request, assembled
//! from defaults, an optional `handscribe.toml` file, and CLI overrides in
//! that order. Credentials never live in the config file; the Groq API key
//! comes from the environment (or `.env` via dotenvy).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ocr::BackendKind;

/// Default fragment confidence threshold.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.2;

/// Default rasterization DPI for PDF pages.
pub const DEFAULT_DPI: u32 = 300;

/// Default Groq vision model.
pub const DEFAULT_VISION_MODEL: &str = "llama-4-scout-17b-16e-instruct";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Page segmentation modes for the classical engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentationMode {
    /// Automatic segmentation with orientation and script detection.
    AutoOsd,
    /// Fully automatic page segmentation (default).
    #[default]
    Auto,
    /// Assume a single column of text.
    SingleColumn,
    /// Assume a single uniform block of text.
    SingleBlock,
    /// Treat the image as a single text line.
    SingleLine,
    /// Sparse text, found in no particular order.
    SparseText,
}

impl SegmentationMode {
    /// Tesseract --psm value.
    pub fn psm(&self) -> u32 {
        match self {
            SegmentationMode::AutoOsd => 1,
            SegmentationMode::Auto => 3,
            SegmentationMode::SingleColumn => 4,
            SegmentationMode::SingleBlock => 6,
            SegmentationMode::SingleLine => 7,
            SegmentationMode::SparseText => 11,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentationMode::AutoOsd => "auto-osd",
            SegmentationMode::Auto => "auto",
            SegmentationMode::SingleColumn => "single-column",
            SegmentationMode::SingleBlock => "single-block",
            SegmentationMode::SingleLine => "single-line",
            SegmentationMode::SparseText => "sparse-text",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto-osd" => Some(SegmentationMode::AutoOsd),
            "auto" => Some(SegmentationMode::Auto),
            "single-column" => Some(SegmentationMode::SingleColumn),
            "single-block" => Some(SegmentationMode::SingleBlock),
            "single-line" => Some(SegmentationMode::SingleLine),
            "sparse-text" => Some(SegmentationMode::SparseText),
            _ => None,
        }
    }
}

/// Immutable configuration snapshot for one extraction run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Which extraction backend to use.
    pub backend: BackendKind,
    /// Recognition languages (tesseract codes, e.g. "eng", "deu").
    pub languages: Vec<String>,
    /// Fragments with a confidence below this are excluded from the text
    /// output. Fragments without a confidence always pass.
    pub confidence_threshold: f32,
    /// Whether to run image cleanup before extraction.
    pub preprocess: bool,
    /// Page segmentation mode for the classical engine.
    pub segmentation: SegmentationMode,
    /// Rasterization DPI for PDF pages.
    pub dpi: u32,
    /// Model name for the vision backend.
    pub vision_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Tesseract,
            languages: vec!["eng".to_string()],
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            preprocess: true,
            segmentation: SegmentationMode::Auto,
            dpi: DEFAULT_DPI,
            vision_model: DEFAULT_VISION_MODEL.to_string(),
        }
    }
}

impl Settings {
    /// Validate ranges before a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::InvalidValue(format!(
                "confidence threshold {} outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if self.languages.is_empty() {
            return Err(ConfigError::InvalidValue(
                "language set must not be empty".to_string(),
            ));
        }
        if self.dpi == 0 {
            return Err(ConfigError::InvalidValue("dpi must be positive".to_string()));
        }
        Ok(())
    }
}

/// Values from an optional `handscribe.toml`. Unset fields fall back to
/// defaults; CLI flags override both.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub backend: Option<String>,
    pub languages: Option<Vec<String>>,
    pub confidence_threshold: Option<f32>,
    pub preprocess: Option<bool>,
    pub segmentation: Option<SegmentationMode>,
    pub dpi: Option<u32>,
    pub vision_model: Option<String>,
}

impl FileConfig {
    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Find a config file: `./handscribe.toml`, then the user config dir.
    pub fn discover() -> Option<PathBuf> {
        let local = PathBuf::from("handscribe.toml");
        if local.exists() {
            return Some(local);
        }
        let user = dirs::config_dir()?.join("handscribe").join("config.toml");
        user.exists().then_some(user)
    }

    /// Apply file values on top of the given settings.
    pub fn apply(self, settings: &mut Settings) -> Result<(), ConfigError> {
        if let Some(backend) = self.backend {
            settings.backend = BackendKind::from_str(&backend).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "unknown backend '{}' (expected tesseract, paddleocr, or groq)",
                    backend
                ))
            })?;
        }
        if let Some(languages) = self.languages {
            settings.languages = languages;
        }
        if let Some(threshold) = self.confidence_threshold {
            settings.confidence_threshold = threshold;
        }
        if let Some(preprocess) = self.preprocess {
            settings.preprocess = preprocess;
        }
        if let Some(segmentation) = self.segmentation {
            settings.segmentation = segmentation;
        }
        if let Some(dpi) = self.dpi {
            settings.dpi = dpi;
        }
        if let Some(vision_model) = self.vision_model {
            settings.vision_model = vision_model;
        }
        Ok(())
    }
}
