//! Tesseract classical engine backend.
//!
//! One full-page recognition pass via the tesseract command-line tool,
//! honoring the configured language set and page segmentation mode. Emits a
//! single fragment with no confidence or geometry.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use tempfile::TempDir;

use super::backend::{BackendKind, ExtractionResult, Fragment, OcrBackend, OcrError};
use super::model_utils::check_binary;
use super::pages::Page;
use crate::config::Settings;

/// Tesseract OCR backend.
pub struct TesseractBackend;

impl TesseractBackend {
    /// Create a new Tesseract backend.
    pub fn new() -> Self {
        Self
    }

    /// Run Tesseract on an image file.
    fn run_tesseract(
        &self,
        image_path: &Path,
        languages: &str,
        psm: u32,
    ) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", languages])
            .args(["--psm", &psm.to_string()])
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::Recognition(format!(
                        "tesseract failed: {}",
                        stderr.trim()
                    )))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendUnavailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for TesseractBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Tesseract
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    fn extract(&self, page: &Page, settings: &Settings) -> Result<ExtractionResult, OcrError> {
        let start = Instant::now();

        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join(format!("page-{}.png", page.index));
        page.image
            .save(&image_path)
            .map_err(|e| OcrError::Image(format!("failed to write page {}: {}", page.index, e)))?;

        let languages = settings.languages.join("+");
        let text = self.run_tesseract(&image_path, &languages, settings.segmentation.psm())?;

        Ok(ExtractionResult::timed(
            vec![Fragment::plain(text)],
            BackendKind::Tesseract,
            None,
            start,
        ))
    }
}
