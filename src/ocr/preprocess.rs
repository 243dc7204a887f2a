//! Per-page image cleanup applied before extraction.
//!
//! Two binarization strategies, one per local backend family: adaptive
//! thresholding suits the detector's region proposals, median-blur plus
//! global Otsu suits a full-page classical pass. The strategies are never
//! combined; the assembler picks the one matching the active backend.

use image::DynamicImage;
use imageproc::contrast::{adaptive_threshold, otsu_level, threshold, ThresholdType};
use imageproc::filter::median_filter;

use super::backend::BackendKind;
use super::pages::Page;

/// Neighborhood radius for adaptive thresholding. Fixed configuration, not
/// user-tunable.
const ADAPTIVE_BLOCK_RADIUS: u32 = 16;

/// Median filter radius for denoising before Otsu.
const MEDIAN_RADIUS: u32 = 1;

/// Cleanup strategy for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreprocessStrategy {
    /// Pass-through: the page feeds the backend unchanged.
    None,
    /// Grayscale + adaptive mean thresholding. Paired with PaddleOCR.
    AdaptiveBinarize,
    /// Grayscale + median denoise + global Otsu threshold. Paired with
    /// Tesseract.
    DenoiseOtsu,
}

impl PreprocessStrategy {
    /// Strategy matching the active backend. The remote vision backend
    /// always receives the raw page; cloud models handle their own
    /// normalization.
    pub fn for_backend(backend: BackendKind, enabled: bool) -> Self {
        if !enabled {
            return PreprocessStrategy::None;
        }
        match backend {
            BackendKind::PaddleOcr => PreprocessStrategy::AdaptiveBinarize,
            BackendKind::Tesseract => PreprocessStrategy::DenoiseOtsu,
            BackendKind::Groq => PreprocessStrategy::None,
        }
    }
}

/// Apply the strategy to a page, producing a page with the same index and
/// dimensions. Never fails on a valid image.
pub fn preprocess(page: &Page, strategy: PreprocessStrategy) -> Page {
    let image = match strategy {
        PreprocessStrategy::None => page.image.clone(),
        PreprocessStrategy::AdaptiveBinarize => {
            let gray = page.image.to_luma8();
            DynamicImage::ImageLuma8(adaptive_threshold(&gray, ADAPTIVE_BLOCK_RADIUS))
        }
        PreprocessStrategy::DenoiseOtsu => {
            let gray = page.image.to_luma8();
            let denoised = median_filter(&gray, MEDIAN_RADIUS, MEDIAN_RADIUS);
            let level = otsu_level(&denoised);
            DynamicImage::ImageLuma8(threshold(&denoised, level, ThresholdType::Binary))
        }
    };

    Page {
        index: page.index,
        image,
    }
}
