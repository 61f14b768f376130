// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider for the Persona chat bot.
//!
//! Canonical turns are translated into Gemini's shape: system turns become
//! the `systemInstruction`, `assistant` becomes `model`, and the final user
//! turn is sent last in `contents` after the prior conversation.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use persona_config::PersonaConfig;
use persona_core::{
    AdapterType, AiProvider, ChatRole, ChatTurn, GenerationRequest, GenerationResponse,
    HealthStatus, PersonaError, PluginAdapter,
};

use crate::client::GeminiClient;
use crate::types::{
    Content, GenerateContentRequest, GenerationConfig, MODEL_ROLE, USER_ROLE,
    permissive_safety_settings,
};

/// Environment variable consulted when `gemini.api_key` is unset.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1000;
const CONNECTION_PROMPT: &str = "Hello, reply with just \"OK\"";

pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    /// Builds the provider from the `[gemini]` config section.
    ///
    /// API key resolution: `gemini.api_key`, then `GEMINI_API_KEY`, then error.
    pub fn new(config: &PersonaConfig) -> Result<Self, PersonaError> {
        let api_key = persona_config::resolve_api_key(config.gemini.api_key.as_deref(), API_KEY_ENV)?;
        let client = GeminiClient::new(
            &api_key,
            config.gemini.model.clone(),
            config.gemini.base_url.clone(),
        )?;
        info!(model = %config.gemini.model, "Gemini provider initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }

    async fn try_generate(&self, request: GenerationRequest) -> Result<String, PersonaError> {
        let request = to_content_request(&request)?;
        let response = self.client.generate_content(&request).await?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => {
                let reason = response
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .or_else(|| response.candidates.first().and_then(|c| c.finish_reason.clone()));
                if let Some(reason) = reason {
                    debug!(reason = %reason, "Gemini returned no text");
                }
                Err(PersonaError::provider("No response from AI"))
            }
        }
    }
}

/// Translates canonical turns into a Gemini request.
///
/// All system turns are merged into the system instruction. The last
/// non-system turn must be a user turn; it becomes the live prompt.
pub fn to_content_request(request: &GenerationRequest) -> Result<GenerateContentRequest, PersonaError> {
    let (system, conversation): (Vec<&ChatTurn>, Vec<&ChatTurn>) = request
        .messages
        .iter()
        .partition(|turn| turn.role == ChatRole::System);

    match conversation.last() {
        Some(turn) if turn.role == ChatRole::User => {}
        _ => return Err(PersonaError::InvalidInput("No user message found".into())),
    }

    let system_instruction = (!system.is_empty()).then(|| {
        let text = system
            .iter()
            .map(|turn| turn.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Content::text(None, text)
    });

    let contents = conversation
        .iter()
        .map(|turn| {
            let role = match turn.role {
                ChatRole::Assistant => MODEL_ROLE,
                _ => USER_ROLE,
            };
            Content::text(Some(role), turn.content.clone())
        })
        .collect();

    Ok(GenerateContentRequest {
        contents,
        system_instruction,
        generation_config: Some(GenerationConfig {
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_output_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }),
        safety_settings: permissive_safety_settings(),
    })
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, PersonaError> {
        // Avoids spending quota; `test_connection` performs a real call.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PersonaError> {
        debug!("Gemini provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn model(&self) -> &str {
        self.client.model()
    }

    async fn generate(&self, request: GenerationRequest) -> GenerationResponse {
        match self.try_generate(request).await {
            Ok(text) => GenerationResponse::ok(text),
            Err(e) => {
                warn!(error = %e, "Gemini generation failed");
                GenerationResponse::failed(e.to_string())
            }
        }
    }

    async fn test_connection(&self) -> bool {
        let request = GenerationRequest {
            messages: vec![ChatTurn::user(CONNECTION_PROMPT)],
            temperature: None,
            max_tokens: None,
        };
        match self.try_generate(request).await {
            Ok(text) => !text.is_empty(),
            Err(e) => {
                warn!(error = %e, "Gemini connection test failed");
                false
            }
        }
    }
}
