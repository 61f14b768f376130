// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Persona configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PersonaConfig {
    /// Bot identity and persona settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Which AI backend answers messages.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Google Gemini settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// OpenRouter settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Reply pacing and retrieval settings.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Knowledge store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Inbound message filtering.
    #[serde(default)]
    pub channel: ChannelConfig,
}

/// Bot identity and persona configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs and the interactive shell.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline persona prompt. Overridden by `persona_prompt_file` if both set.
    #[serde(default)]
    pub persona_prompt: Option<String>,

    /// Path to a text file containing the persona prompt.
    #[serde(default)]
    pub persona_prompt_file: Option<String>,

    /// Reply sent when generation fails.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            persona_prompt: None,
            persona_prompt_file: None,
            fallback_reply: default_fallback_reply(),
        }
    }
}

fn default_agent_name() -> String {
    "persona".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fallback_reply() -> String {
    "Maaf, ada masalah saat memproses pesanmu. Coba lagi nanti ya! 🙏".to_string()
}

/// Supported AI backends.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenRouter,
}

/// Active provider selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub active: ProviderKind,
}

/// Google Gemini configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

/// OpenRouter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenRouterConfig {
    /// API key. `None` falls back to the `OPENROUTER_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openrouter_model")]
    pub model: String,

    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,

    /// Value of the `HTTP-Referer` attribution header.
    #[serde(default = "default_openrouter_referer")]
    pub referer: String,

    /// Value of the `X-Title` attribution header.
    #[serde(default = "default_openrouter_title")]
    pub title: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openrouter_model(),
            base_url: default_openrouter_base_url(),
            referer: default_openrouter_referer(),
            title: default_openrouter_title(),
        }
    }
}

fn default_openrouter_model() -> String {
    "google/gemini-2.0-flash-exp:free".to_string()
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_openrouter_referer() -> String {
    "https://github.com/persona-bot/persona".to_string()
}

fn default_openrouter_title() -> String {
    "Persona Chat Bot".to_string()
}

/// Reply pacing, memory, and retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyConfig {
    /// Lower bound of the human-like delay before a reply is released.
    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the human-like delay.
    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,

    /// Turns kept per conversation before the oldest is evicted.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Knowledge entries injected into each prompt.
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,

    /// Whether retrieved knowledge is added to prompts.
    #[serde(default = "default_use_context")]
    pub use_context: bool,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
            max_history: default_max_history(),
            retrieval_limit: default_retrieval_limit(),
            use_context: default_use_context(),
        }
    }
}

fn default_delay_min_ms() -> u64 {
    1000
}

fn default_delay_max_ms() -> u64 {
    3000
}

fn default_max_history() -> usize {
    20
}

fn default_retrieval_limit() -> usize {
    5
}

fn default_use_context() -> bool {
    true
}

/// Knowledge store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable write-ahead logging.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("persona").join("knowledge.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("knowledge.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Inbound message filtering.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Identifier of the bot's own account; messages from it are ignored.
    #[serde(default)]
    pub self_id: Option<String>,

    /// When non-empty, only these senders get replies.
    #[serde(default)]
    pub allowed_senders: Vec<String>,
}
