//! Shared infrastructure for cloud vision backends.
//!
//! Provides page encoding, rate limiting, retry logic, and async-to-sync
//! bridging so backend implementations stay focused on their wire format.

use std::future::Future;

use base64::Engine;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::backend::OcrError;
use super::pages::Page;
use crate::http_client::HttpResponse;
use crate::rate_limit::{backoff_delay, get_delay_from_env, parse_retry_after};

/// Maximum retry attempts on rate limit (429) errors.
const MAX_RETRIES: u32 = 5;

/// Transcription prompt for vision backends. Preserving layout matters for
/// handwritten notes, where bullet points and arrows carry meaning.
pub const VISION_TRANSCRIPTION_PROMPT: &str = "Transcribe all handwritten and printed text in this image. \
Preserve the formatting (bullet points, arrows, line breaks) exactly as it appears. \
Return only the transcription, with no explanations or commentary.";

/// Encode a page image as a base64 PNG data URL.
pub fn encode_page_data_url(page: &Page) -> Result<String, OcrError> {
    let mut png = Vec::new();
    page.image
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| OcrError::Image(format!("failed to encode page {}: {}", page.index, e)))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
    Ok(format!("data:image/png;base64,{}", encoded))
}

/// Apply a configurable delay before an API request, keeping sequential
/// page calls inside the remote service's quota.
pub async fn apply_rate_delay(env_var: &str, default_ms: u64, backend_name: &str) {
    let delay = get_delay_from_env(env_var, default_ms);
    if delay > std::time::Duration::ZERO {
        debug!("{}: waiting {:?} before request", backend_name, delay);
        tokio::time::sleep(delay).await;
    }
}

/// Retry an API request on 429 (rate limited) responses with exponential
/// backoff, honoring the Retry-After header.
///
/// Returns the first non-429 response. If all retries are exhausted,
/// returns `OcrError::RateLimited`.
pub async fn retry_on_rate_limit<F, Fut>(
    backend_name: &str,
    make_request: F,
) -> Result<HttpResponse, OcrError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<HttpResponse, OcrError>>,
{
    let mut attempt = 0;
    loop {
        let response = make_request().await?;

        if response.status.as_u16() != 429 {
            return Ok(response);
        }

        let retry_after = response.retry_after();
        let retry_after_secs = retry_after.and_then(|s| s.parse::<u64>().ok());

        if attempt >= MAX_RETRIES {
            return Err(OcrError::RateLimited { retry_after_secs });
        }

        let wait = parse_retry_after(retry_after).unwrap_or_else(|| backoff_delay(attempt, 1000));

        warn!(
            "{} rate limited (attempt {}), waiting {:?}",
            backend_name,
            attempt + 1,
            wait
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

/// Block on an async future using the current tokio runtime handle.
///
/// Backends implement the synchronous extraction trait; this bridges to
/// their async HTTP internals. Callers must run extraction on a blocking
/// thread (`tokio::task::spawn_blocking`), never directly on a runtime
/// worker.
pub fn block_on_async<F, T>(backend_name: &str, future: F) -> Result<T, OcrError>
where
    F: Future<Output = Result<T, OcrError>>,
{
    let handle = Handle::try_current().map_err(|_| {
        OcrError::Recognition(format!(
            "No tokio runtime available for {} extraction",
            backend_name
        ))
    })?;
    handle.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    #[test]
    fn test_encode_page_data_url() {
        let page = Page {
            index: 1,
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))),
        };
        let url = encode_page_data_url(&page).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert!(url.len() > "data:image/png;base64,".len());
    }
}
