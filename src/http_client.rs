//! HTTP client wrapper for remote extraction backends.
//!
//! Thin layer over reqwest: named service for the user agent, a per-request
//! timeout, and a response wrapper exposing the pieces backends consume.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;

/// HTTP client bound to one named remote service.
pub struct HttpClient {
    client: reqwest::Client,
    service: String,
}

impl HttpClient {
    /// Create a client for a service, with a per-request timeout.
    pub fn new(service: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!(
                "{}/{} ({})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                service
            ))
            .build()?;
        Ok(Self {
            client,
            service: service.to_string(),
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// POST a JSON body with extra headers.
    pub async fn post_json_with_headers<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse, reqwest::Error> {
        let mut request = self.client.post(url).json(body);
        for (key, value) in &headers {
            request = request.header(key, value);
        }
        let response = request.send().await?;
        Ok(HttpResponse::from_reqwest(response))
    }
}

/// HTTP response wrapper.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    body: reqwest::Response,
}

impl HttpResponse {
    fn from_reqwest(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_lowercase(), v.to_string()))
            })
            .collect();
        Self {
            status,
            headers,
            body: response,
        }
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the Retry-After header.
    pub fn retry_after(&self) -> Option<&str> {
        self.headers.get("retry-after").map(|s| s.as_str())
    }

    /// Get response body as text.
    pub async fn text(self) -> Result<String, reqwest::Error> {
        self.body.text().await
    }

    /// Deserialize response body as JSON.
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> Result<T, reqwest::Error> {
        self.body.json().await
    }
}
