//! Groq vision backend.
//!
//! Sends each page to Groq's OpenAI-compatible chat completions API with a
//! fixed transcription prompt and the page embedded as a base64 data URL.
//! Requires GROQ_API_KEY.
//!
//! Rate limiting:
//! - Set HANDSCRIBE_VISION_DELAY_MS to configure delay between requests
//!   (default: 200ms)
//! - Automatically retries on 429 with exponential backoff
//! - Respects Retry-After header from API

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::api;
use super::backend::{BackendKind, ExtractionResult, Fragment, OcrBackend, OcrError};
use super::pages::Page;
use crate::config::Settings;
use crate::http_client::HttpClient;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Per-request timeout for vision calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Groq vision backend using the OpenAI-compatible API.
pub struct GroqBackend {
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GroqMessage {
    role: String,
    content: Vec<GroqContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum GroqContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: GroqImageUrl },
}

#[derive(Debug, Serialize)]
struct GroqImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Option<Vec<GroqChoice>>,
    error: Option<GroqApiError>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqApiError {
    message: String,
}

impl GroqBackend {
    /// Create a new Groq backend, reading the API key from the environment.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("GROQ_API_KEY").ok(),
        }
    }

    /// Set the API key explicitly.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn create_client(&self) -> Result<HttpClient, OcrError> {
        HttpClient::new("groq-vision", REQUEST_TIMEOUT)
            .map_err(|e| OcrError::BackendUnavailable(format!("Failed to create HTTP client: {}", e)))
    }

    /// Run one transcription request (async implementation with rate
    /// limiting).
    async fn transcribe_async(
        &self,
        api_key: &str,
        page: &Page,
        model: &str,
    ) -> Result<String, OcrError> {
        let data_url = api::encode_page_data_url(page)?;

        let request = GroqRequest {
            model: model.to_string(),
            messages: vec![GroqMessage {
                role: "user".to_string(),
                content: vec![
                    GroqContent::Text {
                        text: api::VISION_TRANSCRIPTION_PROMPT.to_string(),
                    },
                    GroqContent::ImageUrl {
                        image_url: GroqImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: 8192,
            temperature: 0.1,
        };

        let client = self.create_client()?;
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {}", api_key));

        api::apply_rate_delay("HANDSCRIBE_VISION_DELAY_MS", 200, "Groq").await;

        let response = api::retry_on_rate_limit("Groq", || async {
            client
                .post_json_with_headers(GROQ_API_URL, &request, headers.clone())
                .await
                .map_err(|e| OcrError::BackendUnavailable(format!("HTTP request failed: {}", e)))
        })
        .await?;

        if !response.is_success() {
            let status = response.status;
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::BackendUnavailable(format!(
                "Groq API error ({}): {}",
                status, body
            )));
        }

        let groq_response: GroqResponse = response
            .json()
            .await
            .map_err(|e| OcrError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = groq_response.error {
            return Err(OcrError::BackendUnavailable(format!(
                "Groq API error: {}",
                error.message
            )));
        }

        let text = groq_response
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(OcrError::MalformedResponse(
                "Groq returned no transcription text".to_string(),
            ));
        }

        Ok(text)
    }
}

impl Default for GroqBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for GroqBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Groq
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn availability_hint(&self) -> String {
        if self.api_key.is_none() {
            "GROQ_API_KEY not set. Get an API key from https://console.groq.com/".to_string()
        } else {
            "Groq vision is available".to_string()
        }
    }

    fn extract(&self, page: &Page, settings: &Settings) -> Result<ExtractionResult, OcrError> {
        // Credential check happens before any request is attempted, so a
        // missing key halts the batch rather than failing page by page.
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| OcrError::Configuration("GROQ_API_KEY not set".to_string()))?;

        let start = Instant::now();
        let text = api::block_on_async(
            "Groq",
            self.transcribe_async(&api_key, page, &settings.vision_model),
        )?;

        Ok(ExtractionResult::timed(
            vec![Fragment::plain(text)],
            BackendKind::Groq,
            Some(settings.vision_model.clone()),
            start,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn blank_page() -> Page {
        Page {
            index: 1,
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]))),
        }
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let backend = GroqBackend { api_key: None };
        assert!(!backend.is_available());

        let err = backend
            .extract(&blank_page(), &Settings::default())
            .unwrap_err();
        assert!(matches!(err, OcrError::Configuration(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_with_api_key_becomes_available() {
        let backend = GroqBackend { api_key: None }.with_api_key("gsk_test");
        assert!(backend.is_available());
    }
}
