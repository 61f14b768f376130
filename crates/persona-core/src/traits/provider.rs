// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI provider trait implemented by the Gemini and OpenRouter backends.

use async_trait::async_trait;

use crate::traits::adapter::PluginAdapter;
use crate::types::{GenerationRequest, GenerationResponse};

/// A text-generation backend.
///
/// Implementations must retry rate-limited calls according to
/// [`crate::RetryPolicy`] and must report every failure through
/// [`GenerationResponse::failed`] rather than returning an error.
#[async_trait]
pub trait AiProvider: PluginAdapter {
    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Generates a reply for the given conversation.
    async fn generate(&self, request: GenerationRequest) -> GenerationResponse;

    /// Sends a minimal prompt and reports whether the backend answered.
    async fn test_connection(&self) -> bool;
}
