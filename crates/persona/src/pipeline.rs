// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires store, retriever, prompt, provider, and memory into a
//! [`MessageHandler`], and implements `persona respond`.

use std::sync::Arc;

use colored::Colorize;
use tracing::info;

use persona_agent::{MessageHandler, ResponseGenerator};
use persona_config::PersonaConfig;
use persona_context::{ConversationMemory, PromptBuilder, load_persona_prompt};
use persona_core::PersonaError;
use persona_knowledge::KnowledgeRetriever;

use crate::providers::create_provider;

/// Builds the response generator for `config`.
pub async fn build_responder(config: &PersonaConfig) -> Result<ResponseGenerator, PersonaError> {
    let store = Arc::new(persona_storage::open_store(&config.storage).await?);
    let retriever = Arc::new(KnowledgeRetriever::new(store));
    let persona = load_persona_prompt(&config.agent).await?;
    let provider = create_provider(config)?;

    Ok(ResponseGenerator::new(retriever, PromptBuilder::new(persona), provider)
        .configured(&config.reply))
}

/// Builds the full inbound pipeline for `config`.
pub async fn build_handler(config: &PersonaConfig) -> Result<MessageHandler, PersonaError> {
    let responder = build_responder(config).await?;
    let memory = Arc::new(ConversationMemory::new(config.reply.max_history));
    info!(
        agent = config.agent.name.as_str(),
        max_history = config.reply.max_history,
        "message pipeline ready"
    );
    Ok(MessageHandler::new(responder, memory, config))
}

/// Runs `persona respond`: one reply, no history, no delay.
pub async fn run_respond(
    config: &PersonaConfig,
    message: &str,
    use_context: bool,
) -> Result<(), PersonaError> {
    let responder = build_responder(config).await?;
    let outcome = responder.generate(message, use_context, &[]).await;

    if !outcome.success {
        return Err(PersonaError::provider(
            outcome.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    println!("{}", outcome.text);
    let context_note = if outcome.context_used {
        "context used"
    } else {
        "no context"
    };
    eprintln!("{}", format!("({context_note})").dimmed());
    Ok(())
}
