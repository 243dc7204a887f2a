//! OCR backend abstraction for the transcription pipeline.
//!
//! Supports three interchangeable extraction backends:
//! - Tesseract: classical OCR via command-line (CPU)
//! - PaddleOCR: CNN-based detection + recognition via ONNX Runtime
//! - Groq: cloud vision-LLM transcription (GROQ_API_KEY)

use std::time::Instant;

use thiserror::Error;

use crate::config::Settings;
use crate::ocr::pages::Page;

/// Errors from the extraction pipeline and its backends.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Missing or invalid configuration (e.g. API key). Halts before any
    /// page is processed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upload is neither a supported raster image nor a PDF.
    #[error("Unsupported upload format: {0}")]
    UnsupportedFormat(String),

    /// PDF rasterization failed or produced no pages.
    #[error("PDF conversion failed: {0}")]
    Conversion(String),

    /// Backend cannot run: missing binary, missing credential at call time,
    /// network or service failure.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// Backend answered but carried no usable text.
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    /// Recognition run failed on an otherwise available backend.
    #[error("Recognition failed: {0}")]
    Recognition(String),

    /// Remote service rate limit persisted through all retries.
    #[error("Rate limited, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Required model files could not be located or downloaded.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Image decode or encode failure.
    #[error("Image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    /// Whether this error aborts the whole request. Non-fatal errors are
    /// isolated to the failing page and assembly continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OcrError::Configuration(_) | OcrError::UnsupportedFormat(_) | OcrError::Conversion(_)
        )
    }
}

/// One recognized piece of text on a page.
///
/// The detector backend emits one fragment per detected text region, each
/// with a confidence score and bounding quadrilateral. The vision and
/// classical backends emit a single fragment per page with neither.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Recognized text.
    pub text: String,
    /// Confidence in [0, 1], when the backend reports one.
    pub confidence: Option<f32>,
    /// Bounding quadrilateral in page pixel coordinates, when detected.
    pub region: Option<[(f32, f32); 4]>,
}

impl Fragment {
    /// A whole-page fragment with no confidence or geometry.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            region: None,
        }
    }

    /// Whether this fragment survives the given confidence threshold.
    /// Fragments without a confidence value are always kept.
    pub fn passes(&self, threshold: f32) -> bool {
        self.confidence.map_or(true, |c| c >= threshold)
    }
}

/// Result of running one backend over one page.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Fragments in backend emission order.
    pub fragments: Vec<Fragment>,
    /// Which backend produced this result.
    pub backend: BackendKind,
    /// Which model was used, if applicable.
    pub model: Option<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Build a timed result from fragments and the instant extraction began.
    pub fn timed(
        fragments: Vec<Fragment>,
        backend: BackendKind,
        model: Option<String>,
        start: Instant,
    ) -> Self {
        Self {
            fragments,
            backend,
            model,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Available extraction backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Tesseract OCR via command-line.
    Tesseract,
    /// PaddleOCR detection + recognition via ONNX Runtime.
    PaddleOcr,
    /// Groq vision-LLM transcription API.
    Groq,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Tesseract => "tesseract",
            BackendKind::PaddleOcr => "paddleocr",
            BackendKind::Groq => "groq",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tesseract" => Some(BackendKind::Tesseract),
            "paddleocr" | "paddle" => Some(BackendKind::PaddleOcr),
            "groq" => Some(BackendKind::Groq),
            _ => None,
        }
    }

    /// Whether this backend sends work to a remote API rather than running
    /// locally.
    pub fn is_remote(&self) -> bool {
        matches!(self, BackendKind::Groq)
    }

    /// Instantiate the backend selected by configuration.
    pub fn create(&self) -> Result<Box<dyn OcrBackend>, OcrError> {
        match self {
            BackendKind::Tesseract => Ok(Box::new(crate::ocr::tesseract::TesseractBackend::new())),
            BackendKind::Groq => Ok(Box::new(crate::ocr::groq::GroqBackend::new())),
            #[cfg(feature = "ocr-paddle")]
            BackendKind::PaddleOcr => Ok(Box::new(crate::ocr::paddle::PaddleBackend::new())),
            #[cfg(not(feature = "ocr-paddle"))]
            BackendKind::PaddleOcr => Err(OcrError::BackendUnavailable(
                "PaddleOCR not compiled (enable the ocr-paddle feature)".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for extraction backends.
pub trait OcrBackend: Send + Sync {
    /// Get the backend kind.
    fn kind(&self) -> BackendKind;

    /// Check if this backend can run (dependencies installed, credentials set).
    fn is_available(&self) -> bool;

    /// Describe what is needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Extract text fragments from a single page.
    fn extract(&self, page: &Page, settings: &Settings) -> Result<ExtractionResult, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_round_trip() {
        for kind in [BackendKind::Tesseract, BackendKind::PaddleOcr, BackendKind::Groq] {
            assert_eq!(BackendKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(BackendKind::from_str("paddle"), Some(BackendKind::PaddleOcr));
        assert_eq!(BackendKind::from_str("easyocr"), None);
    }

    #[test]
    fn test_fatal_classification() {
        assert!(OcrError::Configuration("no key".into()).is_fatal());
        assert!(OcrError::UnsupportedFormat("text/html".into()).is_fatal());
        assert!(OcrError::Conversion("bad pdf".into()).is_fatal());
        assert!(!OcrError::BackendUnavailable("offline".into()).is_fatal());
        assert!(!OcrError::MalformedResponse("empty".into()).is_fatal());
        assert!(!OcrError::RateLimited { retry_after_secs: None }.is_fatal());
    }

    #[test]
    fn test_fragment_threshold() {
        let scored = Fragment {
            text: "hello".into(),
            confidence: Some(0.4),
            region: None,
        };
        assert!(scored.passes(0.2));
        assert!(scored.passes(0.4));
        assert!(!scored.passes(0.5));
        assert!(Fragment::plain("hi").passes(1.0));
    }
}
