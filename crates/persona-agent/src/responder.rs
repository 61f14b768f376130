// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-message response pipeline.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use persona_config::model::ReplyConfig;
use persona_context::PromptBuilder;
use persona_core::{AiProvider, ChatTurn, GenerationRequest};
use persona_knowledge::KnowledgeRetriever;

use crate::cleanup::clean_response;

/// Sampling temperature for every reply.
pub const TEMPERATURE: f32 = 0.7;

/// Token ceiling for every reply.
pub const MAX_TOKENS: u32 = 1000;

/// Knowledge entries retrieved per message unless configured otherwise.
pub const DEFAULT_RETRIEVAL_LIMIT: usize = 5;

/// Bounds of the pause taken before a reply is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyDelay {
    pub min: Duration,
    pub max: Duration,
}

impl ReplyDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &ReplyConfig) -> Self {
        Self::new(
            Duration::from_millis(config.delay_min_ms),
            Duration::from_millis(config.delay_max_ms),
        )
    }

    /// Draws a duration uniformly from `[min, max]`.
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

impl Default for ReplyDelay {
    fn default() -> Self {
        Self::from_config(&ReplyConfig::default())
    }
}

/// Result of one pass through the pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseOutcome {
    pub success: bool,
    /// Cleaned reply; empty on failure.
    pub text: String,
    pub error: Option<String>,
    /// True when retrieved memories were placed in the prompt.
    pub context_used: bool,
}

/// Retrieves memories, builds the prompt, and calls the active provider.
///
/// The generator never touches conversation memory. Callers read history
/// before the call and record turns afterwards.
pub struct ResponseGenerator {
    retriever: Arc<KnowledgeRetriever>,
    prompt: PromptBuilder,
    provider: Arc<dyn AiProvider>,
    delay: ReplyDelay,
    retrieval_limit: usize,
}

impl ResponseGenerator {
    pub fn new(
        retriever: Arc<KnowledgeRetriever>,
        prompt: PromptBuilder,
        provider: Arc<dyn AiProvider>,
    ) -> Self {
        Self {
            retriever,
            prompt,
            provider,
            delay: ReplyDelay::default(),
            retrieval_limit: DEFAULT_RETRIEVAL_LIMIT,
        }
    }

    /// Applies delay bounds and retrieval limit from the `[reply]` section.
    pub fn configured(mut self, config: &ReplyConfig) -> Self {
        self.delay = ReplyDelay::from_config(config);
        self.retrieval_limit = config.retrieval_limit;
        self
    }

    pub fn with_delay(mut self, delay: ReplyDelay) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_retrieval_limit(mut self, limit: usize) -> Self {
        self.retrieval_limit = limit;
        self
    }

    pub fn provider(&self) -> &Arc<dyn AiProvider> {
        &self.provider
    }

    pub fn retriever(&self) -> &Arc<KnowledgeRetriever> {
        &self.retriever
    }

    pub fn delay(&self) -> ReplyDelay {
        self.delay
    }

    /// Produces a reply to `message`.
    ///
    /// `history` must not contain `message` itself. Retrieval is skipped when
    /// `use_context` is false; a retrieval failure only drops the context.
    pub async fn generate(
        &self,
        message: &str,
        use_context: bool,
        history: &[ChatTurn],
    ) -> ResponseOutcome {
        let mut context = None;
        if use_context {
            let retrieval = self.retriever.retrieve(message, self.retrieval_limit).await;
            if retrieval.success && !retrieval.sources.is_empty() {
                debug!(count = retrieval.sources.len(), "found relevant memories");
                context = Some(retrieval.context);
            }
        }
        let context_used = context.is_some();

        let request = GenerationRequest {
            messages: self.prompt.build(message, context.as_deref(), history),
            temperature: Some(TEMPERATURE),
            max_tokens: Some(MAX_TOKENS),
        };

        debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            turns = request.messages.len(),
            "generating reply"
        );
        let response = self.provider.generate(request).await;

        if !response.success {
            warn!(
                error = response.error.as_deref().unwrap_or("unknown error"),
                "provider failed to generate a reply"
            );
            return ResponseOutcome {
                success: false,
                text: String::new(),
                error: response.error,
                context_used,
            };
        }

        let text = clean_response(&response.text);
        info!(context_used, chars = text.chars().count(), "reply generated");
        ResponseOutcome {
            success: true,
            text,
            error: None,
            context_used,
        }
    }

    /// Waits a random duration within the configured bounds, then generates.
    pub async fn generate_with_delay(
        &self,
        message: &str,
        use_context: bool,
        history: &[ChatTurn],
    ) -> ResponseOutcome {
        let pause = self.delay.sample();
        debug!(delay_ms = pause.as_millis() as u64, "pausing before reply");
        tokio::time::sleep(pause).await;
        self.generate(message, use_context, history).await
    }
}
