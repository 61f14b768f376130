// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixture: in-memory knowledge store, retriever, conversation
//! memory, and a scripted provider.

use std::sync::Arc;

use persona_context::{ConversationMemory, PromptBuilder};
use persona_core::{NewKnowledgeEntry, PersonaError};
use persona_knowledge::KnowledgeRetriever;
use persona_storage::KnowledgeStore;

use crate::MockProvider;

/// Persona used by harness-built prompts.
pub const TEST_PERSONA: &str = "You are Rina, a test persona.";

pub struct TestHarness {
    pub store: Arc<KnowledgeStore>,
    pub retriever: Arc<KnowledgeRetriever>,
    pub memory: Arc<ConversationMemory>,
    pub provider: Arc<MockProvider>,
    pub prompt: PromptBuilder,
}

impl TestHarness {
    pub async fn new() -> Result<Self, PersonaError> {
        Self::with_provider(MockProvider::new()).await
    }

    pub async fn with_provider(provider: MockProvider) -> Result<Self, PersonaError> {
        let store = Arc::new(KnowledgeStore::open_in_memory().await?);
        Ok(Self {
            retriever: Arc::new(KnowledgeRetriever::new(Arc::clone(&store))),
            store,
            memory: Arc::new(ConversationMemory::default()),
            provider: Arc::new(provider),
            prompt: PromptBuilder::new(TEST_PERSONA),
        })
    }

    /// Stores a chat fragment attributed to `sender`.
    pub async fn remember(&self, sender: &str, content: &str) -> Result<i64, PersonaError> {
        self.store
            .insert(
                NewKnowledgeEntry::new(content, "imported_chat")
                    .with_context(format!("From chat with {sender} at 01/01/24, 10:00")),
            )
            .await
    }
}
