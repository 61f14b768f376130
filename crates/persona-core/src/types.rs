// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the knowledge, context, provider, and agent crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
}

// --- Conversation types ---

/// Role of a single turn in a model conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    /// Wire name used by OpenAI-compatible APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One message in a conversation (`{role, content}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// --- Provider types ---

/// A generation request sent to an AI provider.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Ordered conversation; system turns first, current user message last.
    pub messages: Vec<ChatTurn>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Outcome of a generation call.
///
/// Providers never let an error escape as a panic or `Err`; failures are
/// folded into `success = false` with a human-readable `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub success: bool,
    pub text: String,
    pub error: Option<String>,
}

impl GenerationResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: String::new(),
            error: Some(error.into()),
        }
    }
}

// --- Knowledge types ---

/// A persisted knowledge fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: i64,
    pub content: String,
    /// Free-form provenance, e.g. `From chat with Alice at 01/02/24, 10:00`.
    pub context: Option<String>,
    pub category: String,
    pub created_at: String,
}

/// A knowledge fragment that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKnowledgeEntry {
    pub content: String,
    pub context: Option<String>,
    pub category: String,
}

impl NewKnowledgeEntry {
    pub fn new(content: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            context: None,
            category: category.into(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// A knowledge entry paired with its full-text relevance score.
///
/// Lower `relevance` is more relevant (SQLite `bm25()` ordering).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub entry: KnowledgeEntry,
    pub relevance: f64,
}

// --- Channel types ---

/// A message arriving from a chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Conversation key used for memory and serialization.
    pub conversation_id: String,
    pub sender_id: String,
    pub text: String,
    pub is_group: bool,
}

/// A reply to be delivered back to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub conversation_id: String,
    pub text: String,
    /// `true` when the text is the fixed fallback reply.
    pub is_fallback: bool,
}
