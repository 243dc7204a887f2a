//! Upload normalization: one uploaded file becomes an ordered sequence of
//! page images.
//!
//! Raster images decode to a single page; PDFs are rasterized one page per
//! PDF page via pdftoppm. Page indices are contiguous starting at 1, in
//! upload order.

use image::DynamicImage;
use tempfile::TempDir;

use super::backend::OcrError;
use super::pdf_utils;
use crate::utils::mime;

/// A single page image with its 1-based position in the document.
#[derive(Debug, Clone)]
pub struct Page {
    pub index: u32,
    pub image: DynamicImage,
}

/// Ordered pages produced from one upload. Immutable once paginated; lives
/// only for the duration of one extraction request.
#[derive(Debug, Clone)]
pub struct Document {
    pages: Vec<Page>,
}

impl Document {
    /// Build a document from already-prepared pages.
    pub fn from_pages(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Restrict the document to the given page indices (1-based). Retained
    /// pages keep their original indices; unknown indices are ignored.
    pub fn subset(&self, indices: &[u32]) -> Document {
        Document {
            pages: self
                .pages
                .iter()
                .filter(|p| indices.contains(&p.index))
                .cloned()
                .collect(),
        }
    }
}

/// Normalize an upload into pages.
///
/// When `mime_type` is None the type is sniffed from the upload bytes.
/// Supported types: `application/pdf`, `image/png`, `image/jpeg`. The input
/// buffer is never mutated.
pub fn paginate(upload: &[u8], mime_type: Option<&str>, dpi: u32) -> Result<Document, OcrError> {
    let mime = match mime_type {
        Some(m) => m.to_string(),
        None => mime::sniff(upload)
            .ok_or_else(|| {
                OcrError::UnsupportedFormat("unrecognized file content".to_string())
            })?
            .to_string(),
    };

    if mime::is_pdf(&mime) {
        paginate_pdf(upload, dpi)
    } else if mime::is_raster_image(&mime) {
        let image = image::load_from_memory(upload)
            .map_err(|e| OcrError::Conversion(format!("failed to decode {} upload: {}", mime, e)))?;
        Ok(Document {
            pages: vec![Page { index: 1, image }],
        })
    } else {
        Err(OcrError::UnsupportedFormat(mime))
    }
}

/// Rasterize every PDF page at the given DPI into ordered page images.
fn paginate_pdf(upload: &[u8], dpi: u32) -> Result<Document, OcrError> {
    let temp_dir = TempDir::new()?;
    let pdf_path = temp_dir.path().join("upload.pdf");
    std::fs::write(&pdf_path, upload)?;

    let image_paths = pdf_utils::rasterize_pdf(&pdf_path, dpi, temp_dir.path())?;
    if image_paths.is_empty() {
        return Err(OcrError::Conversion(
            "PDF rasterization produced no page images".to_string(),
        ));
    }

    let mut pages = Vec::with_capacity(image_paths.len());
    for (i, path) in image_paths.iter().enumerate() {
        let image = image::open(path).map_err(|e| {
            OcrError::Conversion(format!("failed to decode rasterized page {}: {}", i + 1, e))
        })?;
        pages.push(Page {
            index: (i + 1) as u32,
            image,
        });
    }

    tracing::debug!("paginated PDF into {} pages at {} DPI", pages.len(), dpi);
    Ok(Document { pages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_single_image_is_one_page() {
        let doc = paginate(&png_bytes(12, 8), Some("image/png"), 300).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages()[0].index, 1);
        assert_eq!(doc.pages()[0].image.width(), 12);
        assert_eq!(doc.pages()[0].image.height(), 8);
    }

    #[test]
    fn test_mime_sniffed_when_missing() {
        let doc = paginate(&png_bytes(4, 4), None, 300).unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_unknown_content_rejected() {
        let err = paginate(b"not an image at all", None, 300).unwrap_err();
        assert!(matches!(err, OcrError::UnsupportedFormat(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unsupported_mime_rejected() {
        let err = paginate(&png_bytes(4, 4), Some("text/html"), 300).unwrap_err();
        assert!(matches!(err, OcrError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_corrupt_image_is_conversion_error() {
        let err = paginate(b"garbage", Some("image/png"), 300).unwrap_err();
        assert!(matches!(err, OcrError::Conversion(_)));
    }

    #[test]
    fn test_subset_keeps_original_indices() {
        let pages = (1..=3)
            .map(|i| Page {
                index: i,
                image: DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]))),
            })
            .collect();
        let doc = Document::from_pages(pages);
        let picked = doc.subset(&[3, 1]);
        let indices: Vec<u32> = picked.pages().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 3]);
    }
}
