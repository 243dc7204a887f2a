//! Handscribe - handwritten and printed document transcription.
//!
//! A pipeline that turns an uploaded image or PDF into a plain-text
//! transcription via interchangeable OCR backends: the system tesseract
//! binary, local PaddleOCR models, or Groq's vision API.

pub mod cli;
pub mod config;
pub mod http_client;
pub mod ocr;
pub mod rate_limit;
pub mod utils;
