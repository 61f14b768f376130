// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` API.
//!
//! Rate-limited calls (HTTP 429) are retried by the shared
//! [`RetryPolicy`]; every other failure is returned at once.

use std::time::Duration;

use persona_core::{PersonaError, RetryPolicy};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: String, base_url: String) -> Result<Self, PersonaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| PersonaError::Config(format!("invalid Gemini API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| PersonaError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Overrides the retry schedule (tests use millisecond delays).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Sends `request`, retrying while the API reports rate limiting.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, PersonaError> {
        self.retry.run("gemini", || self.send_once(request)).await
    }

    async fn send_once(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, PersonaError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(request)
            .send()
            .await
            .map_err(|e| PersonaError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "gemini response received");
        let body = response.text().await.map_err(|e| PersonaError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| PersonaError::Provider {
                message: format!("failed to parse Gemini response: {e}"),
                source: Some(Box::new(e)),
            });
        }

        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => format!("Gemini API error ({status}): {}", api_err.error.message),
            Err(_) => format!("Gemini API returned {status}: {body}"),
        };
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(PersonaError::RateLimited { message })
        } else {
            Err(PersonaError::provider(message))
        }
    }
}
