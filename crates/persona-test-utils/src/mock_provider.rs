// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted AI provider for deterministic tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use persona_core::{
    AdapterType, AiProvider, GenerationRequest, GenerationResponse, HealthStatus, PersonaError,
    PluginAdapter,
};

/// Returns queued responses in order; once the queue is empty every call
/// succeeds with `"mock response"`.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<GenerationResponse>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    reachable: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            reachable: true,
            ..Self::default()
        }
    }

    /// Pre-loads successful replies.
    pub fn with_responses<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = texts.into_iter().map(GenerationResponse::ok).collect();
        Self {
            responses: Arc::new(Mutex::new(queue)),
            ..Self::new()
        }
    }

    /// A provider whose connection test fails.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::default()
        }
    }

    pub async fn push_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(GenerationResponse::ok(text));
    }

    pub async fn push_failure(&self, error: impl Into<String>) {
        self.responses.lock().await.push_back(GenerationResponse::failed(error));
    }

    /// Every request received so far.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().await.last().cloned()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
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
        Ok(())
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: GenerationRequest) -> GenerationResponse {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| GenerationResponse::ok("mock response"))
    }

    async fn test_connection(&self) -> bool {
        self.reachable
    }
}
