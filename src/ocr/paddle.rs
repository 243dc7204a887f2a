//! PaddleOCR local detector backend.
//!
//! Text region detection plus recognition via paddle-ocr-rs and ONNX
//! Runtime. Emits one fragment per detected region, each carrying the
//! region's confidence and bounding quadrilateral. Fully local and
//! deterministic for identical pixel input.
//!
//! Models are automatically downloaded on first use from:
//! https://github.com/RapidAI/RapidOCR

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use paddle_ocr_rs::ocr_lite::OcrLite;

use super::backend::{BackendKind, ExtractionResult, Fragment, OcrBackend, OcrError};
use super::model_utils::{ensure_model_file, ModelDirConfig, ModelSpec};
use super::pages::Page;
use crate::config::Settings;

/// Process-wide engine cache keyed by model directory.
///
/// Engines are created once per model configuration and reused for every
/// subsequent call. Inference takes `&mut self`, so access is serialized
/// through the cache mutex.
fn engine_cache() -> &'static Mutex<HashMap<String, OcrLite>> {
    static CACHE: OnceLock<Mutex<HashMap<String, OcrLite>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Model directory configuration for PaddleOCR.
const MODEL_CONFIG: ModelDirConfig = ModelDirConfig {
    subdir: "paddle-ocr",
    required_files: &[DET_MODEL_NAME, REC_MODEL_NAME, CLS_MODEL_NAME],
};

const DET_MODEL_NAME: &str = "ch_PP-OCRv4_det_infer.onnx";
const REC_MODEL_NAME: &str = "ch_PP-OCRv4_rec_infer.onnx";
const CLS_MODEL_NAME: &str = "ch_ppocr_mobile_v2.0_cls_infer.onnx";

/// Model specifications for downloading.
const DET_MODEL: ModelSpec = ModelSpec {
    url: "https://huggingface.co/SWHL/RapidOCR/resolve/main/PP-OCRv4/ch_PP-OCRv4_det_infer.onnx",
    filename: DET_MODEL_NAME,
    size_hint: "4 MB",
};

const REC_MODEL: ModelSpec = ModelSpec {
    url: "https://huggingface.co/SWHL/RapidOCR/resolve/main/PP-OCRv4/ch_PP-OCRv4_rec_infer.onnx",
    filename: REC_MODEL_NAME,
    size_hint: "10 MB",
};

const CLS_MODEL: ModelSpec = ModelSpec {
    url: "https://www.modelscope.cn/models/RapidAI/RapidOCR/resolve/v3.4.0/onnx/PP-OCRv4/cls/ch_ppocr_mobile_v2.0_cls_infer.onnx",
    filename: CLS_MODEL_NAME,
    size_hint: "1 MB",
};

/// Detection parameters passed to OcrLite::detect.
const OCR_PADDING: u32 = 50;
const OCR_BOX_SCORE_THRESH: f32 = 0.5;
const OCR_BOX_THRESH: f32 = 0.3;
const OCR_UNCLIP_RATIO: f32 = 1.6;

/// PaddleOCR backend via ONNX Runtime.
pub struct PaddleBackend;

impl PaddleBackend {
    /// Create a new PaddleOCR backend.
    pub fn new() -> Self {
        Self
    }

    /// Find the model directory, checking standard locations.
    fn find_model_dir(&self) -> Option<PathBuf> {
        MODEL_CONFIG
            .candidate_dirs()
            .into_iter()
            .find(|dir| MODEL_CONFIG.has_required_files(dir))
    }

    /// Ensure models are present, downloading them if necessary.
    fn ensure_models(&self) -> Result<PathBuf, OcrError> {
        if let Some(dir) = self.find_model_dir() {
            return Ok(dir);
        }

        let model_dir = MODEL_CONFIG.default_dir();
        std::fs::create_dir_all(&model_dir).map_err(OcrError::Io)?;

        ensure_model_file(&DET_MODEL, &model_dir)?;
        ensure_model_file(&REC_MODEL, &model_dir)?;
        ensure_model_file(&CLS_MODEL, &model_dir)?;

        Ok(model_dir)
    }

    fn init_engine(model_dir: &Path) -> Result<OcrLite, OcrError> {
        let det = model_dir.join(DET_MODEL_NAME).to_string_lossy().to_string();
        let cls = model_dir.join(CLS_MODEL_NAME).to_string_lossy().to_string();
        let rec = model_dir.join(REC_MODEL_NAME).to_string_lossy().to_string();

        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2)
            .clamp(1, 4);

        let mut ocr = OcrLite::new();
        ocr.init_models(&det, &cls, &rec, threads)
            .map_err(|e| OcrError::Recognition(format!("Failed to init PaddleOCR: {}", e)))?;
        Ok(ocr)
    }
}

impl Default for PaddleBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for PaddleBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::PaddleOcr
    }

    fn is_available(&self) -> bool {
        // Models auto-download on first use
        true
    }

    fn availability_hint(&self) -> String {
        match self.find_model_dir() {
            Some(path) => format!("PaddleOCR models found at {:?}", path),
            None => format!(
                "PaddleOCR models will be auto-downloaded on first use (~15 MB total) to {:?}",
                MODEL_CONFIG.default_dir()
            ),
        }
    }

    fn extract(&self, page: &Page, _settings: &Settings) -> Result<ExtractionResult, OcrError> {
        let start = Instant::now();

        let model_dir = self.ensure_models()?;
        let cache_key = model_dir.to_string_lossy().to_string();

        let rgb = page.image.to_rgb8();
        let max_side_len = rgb.width().max(rgb.height()).clamp(1024, 3072);

        let mut cache = engine_cache()
            .lock()
            .map_err(|_| OcrError::Recognition("OCR engine cache poisoned".to_string()))?;

        if !cache.contains_key(&cache_key) {
            tracing::debug!("initializing PaddleOCR engine for {}", cache_key);
            let engine = Self::init_engine(&model_dir)?;
            cache.insert(cache_key.clone(), engine);
        }
        let ocr = cache
            .get_mut(&cache_key)
            .ok_or_else(|| OcrError::Recognition("OCR engine cache unavailable".to_string()))?;

        let result = ocr
            .detect(
                &rgb,
                OCR_PADDING,
                max_side_len,
                OCR_BOX_SCORE_THRESH,
                OCR_BOX_THRESH,
                OCR_UNCLIP_RATIO,
                false,
                false,
            )
            .map_err(|e| OcrError::Recognition(format!("PaddleOCR detection failed: {}", e)))?;

        let fragments: Vec<Fragment> = result
            .text_blocks
            .into_iter()
            .filter(|block| !block.text.trim().is_empty())
            .map(|block| {
                let region: Option<[(f32, f32); 4]> = block
                    .box_point
                    .iter()
                    .map(|p| (p.x as f32, p.y as f32))
                    .collect::<Vec<_>>()
                    .try_into()
                    .ok();
                Fragment {
                    text: block.text.trim_end().to_string(),
                    confidence: Some(block.box_score.clamp(0.0, 1.0)),
                    region,
                }
            })
            .collect();

        Ok(ExtractionResult::timed(
            fragments,
            BackendKind::PaddleOcr,
            None,
            start,
        ))
    }
}
