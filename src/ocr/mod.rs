//! Document-to-text extraction pipeline.
//!
//! Normalizes an upload (raster image or multi-page PDF) into a sequence of
//! page images, optionally cleans each page up, runs a pluggable extraction
//! backend per page, and assembles the labeled, confidence-filtered result
//! into one transcription.
//!
//! ## Backends
//!
//! - **Tesseract**: classical OCR via the system binary (default)
//! - **PaddleOCR**: local detection + recognition with per-region
//!   confidence and geometry (feature: ocr-paddle)
//! - **Groq**: cloud vision-LLM transcription (GROQ_API_KEY)

mod annotate;
mod api;
mod assemble;
mod backend;
mod model_utils;
mod pages;
mod pdf_utils;
mod preprocess;

mod groq;
mod tesseract;

#[cfg(feature = "ocr-paddle")]
mod paddle;

pub use annotate::{annotate_page, HIGH_CONFIDENCE};
pub use assemble::{assemble, assemble_with_progress, PageOutcome, PageStatus, Transcription};
pub use backend::{BackendKind, ExtractionResult, Fragment, OcrBackend, OcrError};
pub use groq::GroqBackend;
pub use model_utils::check_binary;
pub use pages::{paginate, Document, Page};
pub use preprocess::{preprocess, PreprocessStrategy};
pub use tesseract::TesseractBackend;

#[cfg(feature = "ocr-paddle")]
pub use paddle::PaddleBackend;
