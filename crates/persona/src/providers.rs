// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolves the active AI provider from configuration.
//!
//! One provider is built per process; every conversation shares it.

use std::sync::Arc;

use persona_config::{PersonaConfig, ProviderKind};
use persona_core::{AiProvider, PersonaError};
use tracing::info;

/// Builds the provider selected by `provider.active`.
pub fn create_provider(config: &PersonaConfig) -> Result<Arc<dyn AiProvider>, PersonaError> {
    let provider: Arc<dyn AiProvider> = match config.provider.active {
        ProviderKind::Gemini => gemini(config)?,
        ProviderKind::OpenRouter => openrouter(config)?,
    };
    info!(
        provider = provider.name(),
        model = provider.model(),
        "AI provider ready"
    );
    Ok(provider)
}

#[cfg(feature = "gemini")]
fn gemini(config: &PersonaConfig) -> Result<Arc<dyn AiProvider>, PersonaError> {
    Ok(Arc::new(persona_gemini::GeminiProvider::new(config)?))
}

#[cfg(not(feature = "gemini"))]
fn gemini(_config: &PersonaConfig) -> Result<Arc<dyn AiProvider>, PersonaError> {
    Err(not_compiled_in(ProviderKind::Gemini))
}

#[cfg(feature = "openrouter")]
fn openrouter(config: &PersonaConfig) -> Result<Arc<dyn AiProvider>, PersonaError> {
    Ok(Arc::new(persona_openrouter::OpenRouterProvider::new(config)?))
}

#[cfg(not(feature = "openrouter"))]
fn openrouter(_config: &PersonaConfig) -> Result<Arc<dyn AiProvider>, PersonaError> {
    Err(not_compiled_in(ProviderKind::OpenRouter))
}

#[allow(dead_code)]
fn not_compiled_in(kind: ProviderKind) -> PersonaError {
    PersonaError::Config(format!(
        "provider '{kind}' is not available in this build (enable the `{kind}` feature)"
    ))
}
