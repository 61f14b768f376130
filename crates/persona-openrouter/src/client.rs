// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenRouter's chat completions API.

use std::time::Duration;

use persona_core::{PersonaError, RetryPolicy};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

/// Attribution headers OpenRouter shows on its dashboards.
#[derive(Debug, Clone)]
pub struct Attribution {
    pub referer: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, PersonaError> {
    HeaderValue::from_str(value)
        .map_err(|e| PersonaError::Config(format!("invalid {name} header value: {e}")))
}

impl OpenRouterClient {
    pub fn new(api_key: &str, base_url: String, attribution: &Attribution) -> Result<Self, PersonaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value("Authorization", &format!("Bearer {api_key}"))?,
        );
        headers.insert("HTTP-Referer", header_value("HTTP-Referer", &attribution.referer)?);
        headers.insert("X-Title", header_value("X-Title", &attribution.title)?);
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
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, PersonaError> {
        self.retry.run("openrouter", || self.send_once(request)).await
    }

    async fn send_once(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, PersonaError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| PersonaError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "openrouter response received");
        let body = response.text().await.map_err(|e| PersonaError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| PersonaError::Provider {
                message: format!("failed to parse OpenRouter response: {e}"),
                source: Some(Box::new(e)),
            });
        }

        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => format!("OpenRouter API error ({status}): {}", api_err.error.message),
            Err(_) => format!("OpenRouter API returned {status}: {body}"),
        };
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(PersonaError::RateLimited { message })
        } else {
            Err(PersonaError::provider(message))
        }
    }
}
