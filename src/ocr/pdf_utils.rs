//! PDF-to-image conversion via poppler's pdftoppm.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::backend::OcrError;

/// Hint shown when poppler-utils is missing.
pub const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";

/// Rasterize every page of a PDF into PNG images at the given DPI.
///
/// Returns the generated image paths in page order. All failures, including
/// a missing pdftoppm binary, surface as `OcrError::Conversion` with the
/// underlying cause: rasterization is a prerequisite of pagination, not a
/// per-page concern.
pub fn rasterize_pdf(pdf_path: &Path, dpi: u32, output_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let output_prefix = output_dir.join("page");

    let output = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string()])
        .arg(pdf_path)
        .arg(&output_prefix)
        .output();

    match output {
        Ok(out) if out.status.success() => collect_page_images(output_dir),
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(OcrError::Conversion(format!(
                "pdftoppm failed: {}",
                stderr.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(OcrError::Conversion(PDFTOPPM_NOT_FOUND.to_string()))
        }
        Err(e) => Err(OcrError::Io(e)),
    }
}

/// Collect generated page images in page order.
///
/// pdftoppm names files page-1.png, page-01.png or page-001.png depending on
/// total page count, so a lexicographic sort is already page order.
fn collect_page_images(output_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(output_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
        .collect();
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_page_images_sorted() {
        let temp = TempDir::new().unwrap();
        for name in ["page-03.png", "page-01.png", "page-02.png", "notes.txt"] {
            std::fs::write(temp.path().join(name), b"x").unwrap();
        }

        let images = collect_page_images(temp.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["page-01.png", "page-02.png", "page-03.png"]);
    }

    #[test]
    fn test_collect_page_images_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(collect_page_images(temp.path()).unwrap().is_empty());
    }
}
