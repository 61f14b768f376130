// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenRouter provider for the Persona chat bot.
//!
//! OpenRouter speaks the OpenAI chat completions protocol, so canonical
//! turns are sent as-is.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use persona_config::PersonaConfig;
use persona_core::{
    AdapterType, AiProvider, ChatRole, ChatTurn, GenerationRequest, GenerationResponse,
    HealthStatus, PersonaError, PluginAdapter,
};

use crate::client::{Attribution, OpenRouterClient};
use crate::types::{ApiMessage, ChatCompletionRequest};

/// Environment variable consulted when `openrouter.api_key` is unset.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 500;
const CONNECTION_PROMPT: &str = "Hello, reply with just \"OK\" if you can read this.";

pub struct OpenRouterProvider {
    client: OpenRouterClient,
    model: String,
}

impl OpenRouterProvider {
    /// Builds the provider from the `[openrouter]` config section.
    ///
    /// API key resolution: `openrouter.api_key`, then `OPENROUTER_API_KEY`,
    /// then error.
    pub fn new(config: &PersonaConfig) -> Result<Self, PersonaError> {
        let section = &config.openrouter;
        let api_key = persona_config::resolve_api_key(section.api_key.as_deref(), API_KEY_ENV)?;
        let attribution = Attribution {
            referer: section.referer.clone(),
            title: section.title.clone(),
        };
        let client = OpenRouterClient::new(&api_key, section.base_url.clone(), &attribution)?;
        info!(model = %section.model, "OpenRouter provider initialized");
        Ok(Self::with_client(client, section.model.clone()))
    }

    pub fn with_client(client: OpenRouterClient, model: String) -> Self {
        Self { client, model }
    }

    fn to_completion_request(&self, request: &GenerationRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|turn| ApiMessage {
                    role: turn.role.as_str().to_string(),
                    content: turn.content.clone(),
                })
                .collect(),
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }

    async fn try_generate(&self, request: GenerationRequest) -> Result<String, PersonaError> {
        let last_turn = request
            .messages
            .iter()
            .rev()
            .find(|turn| turn.role != ChatRole::System);
        if !matches!(last_turn, Some(turn) if turn.role == ChatRole::User) {
            return Err(PersonaError::InvalidInput("No user message found".into()));
        }
        let response = self.client.complete(&self.to_completion_request(&request)).await?;
        match response.first_content().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(PersonaError::provider("No response from AI")),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, PersonaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PersonaError> {
        debug!("OpenRouter provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl AiProvider for OpenRouterProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerationRequest) -> GenerationResponse {
        match self.try_generate(request).await {
            Ok(text) => GenerationResponse::ok(text),
            Err(e) => {
                warn!(error = %e, "OpenRouter generation failed");
                GenerationResponse::failed(e.to_string())
            }
        }
    }

    async fn test_connection(&self) -> bool {
        let response = self
            .generate(GenerationRequest {
                messages: vec![ChatTurn::user(CONNECTION_PROMPT)],
                temperature: None,
                max_tokens: Some(10),
            })
            .await;
        response.success
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use persona_core::RetryPolicy;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider(base_url: &str) -> OpenRouterProvider {
        let attribution = Attribution {
            referer: "https://example.test".into(),
            title: "Persona Test".into(),
        };
        let client = OpenRouterClient::new("sk-or-test", base_url.into(), &attribution)
            .unwrap()
            .with_retry_policy(RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(10),
            });
        OpenRouterProvider::with_client(client, "google/gemini-2.0-flash-exp:free".into())
    }

    fn completion(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "gen-1",
            "choices": [{"message": {"role": "assistant", "content": text}, "finish_reason": "stop"}]
        })
    }

    fn conversation() -> GenerationRequest {
        GenerationRequest {
            messages: vec![
                ChatTurn::system("persona"),
                ChatTurn::user("pagi"),
                ChatTurn::assistant("pagi juga"),
                ChatTurn::user("lagi apa?"),
            ],
            temperature: Some(0.7),
            max_tokens: Some(1000),
        }
    }

    #[tokio::test]
    async fn sends_canonical_roles_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-or-test"))
            .and(header("HTTP-Referer", "https://example.test"))
            .and(header("X-Title", "Persona Test"))
            .and(body_partial_json(serde_json::json!({
                "model": "google/gemini-2.0-flash-exp:free",
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "pagi"},
                    {"role": "assistant", "content": "pagi juga"},
                    {"role": "user", "content": "lagi apa?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(" lagi santai ")))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server.uri()).generate(conversation()).await;
        assert_eq!(response, GenerationResponse::ok("lagi santai"));
    }

    #[tokio::test]
    async fn generate_without_user_turn_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider(&server.uri());
        for messages in [
            vec![ChatTurn::system("persona")],
            vec![ChatTurn::user("halo"), ChatTurn::assistant("hai")],
        ] {
            let response = provider
                .generate(GenerationRequest {
                    messages,
                    temperature: None,
                    max_tokens: None,
                })
                .await;
            assert!(!response.success);
            assert!(response.error.unwrap().contains("No user message found"));
        }
    }

    #[tokio::test]
    async fn default_max_tokens_is_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"max_tokens": 500})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let mut request = conversation();
        request.max_tokens = None;
        assert!(provider(&server.uri()).generate(request).await.success);
    }

    #[tokio::test]
    async fn empty_choice_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let response = provider(&server.uri()).generate(conversation()).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("No response from AI"));
    }

    #[tokio::test]
    async fn rate_limit_twice_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit exceeded", "code": 429}
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ketiga")))
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let response = provider(&server.uri()).generate(conversation()).await;
        assert_eq!(response.text, "ketiga");
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn persistent_rate_limit_fails_after_three_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit exceeded", "code": 429}
            })))
            .expect(3)
            .mount(&server)
            .await;

        let response = provider(&server.uri()).generate(conversation()).await;
        assert!(!response.success);
        let error = response.error.unwrap();
        assert!(error.contains("rate limited"), "got: {error}");
    }

    #[tokio::test]
    async fn bad_key_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "No auth credentials found", "code": 401}
            })))
            // One generate call plus one connection test, no retries.
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider(&server.uri());
        let response = provider.generate(conversation()).await;
        assert!(response.error.unwrap().contains("No auth credentials found"));
        assert!(!provider.test_connection().await);
    }

    #[tokio::test]
    async fn connection_test_uses_tiny_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"max_tokens": 10})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("OK")))
            .mount(&server)
            .await;
        assert!(provider(&server.uri()).test_connection().await);
    }
}
