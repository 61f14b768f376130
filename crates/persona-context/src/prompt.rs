// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly.
//!
//! Layout of every prompt:
//!
//! 1. persona instruction (system)
//! 2. retrieved memory, when there is any (system)
//! 3. prior conversation turns, verbatim
//! 4. the current user message

use persona_config::model::AgentConfig;
use persona_core::{ChatTurn, PersonaError};
use tracing::{info, warn};

/// Persona used when none is configured.
pub const DEFAULT_PERSONA: &str = "\
You are a friendly person chatting casually with a friend.

Style:
- Reply in the same language the user writes in.
- Keep replies short and natural, like a text message.
- Do not invent personal facts that you have not been told.";

/// Builds the ordered message list sent to the AI provider.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

impl PromptBuilder {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn set_persona(&mut self, persona: impl Into<String>) {
        self.persona = persona.into();
    }

    /// Assembles the prompt for `user_message`.
    ///
    /// Blank `context` adds no memory turn.
    pub fn build(&self, user_message: &str, context: Option<&str>, history: &[ChatTurn]) -> Vec<ChatTurn> {
        let mut messages = Vec::with_capacity(history.len() + 3);
        messages.push(ChatTurn::system(self.persona.clone()));

        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            messages.push(ChatTurn::system(memory_instruction(context)));
        }

        messages.extend_from_slice(history);
        messages.push(ChatTurn::user(user_message));
        messages
    }
}

fn memory_instruction(context: &str) -> String {
    format!(
        "IMPORTANT FACTS FROM EARLIER CHATS:\n{context}\n\n\
         INSTRUCTION: Treat the information above as your own memories."
    )
}

/// Resolves the persona text: prompt file, then inline prompt, then
/// [`DEFAULT_PERSONA`].
///
/// A configured file that cannot be read is an error. An empty one is
/// logged and skipped.
pub async fn load_persona_prompt(config: &AgentConfig) -> Result<String, PersonaError> {
    if let Some(path) = &config.persona_prompt_file {
        let content = tokio::fs::read_to_string(path).await?;
        if !content.trim().is_empty() {
            info!(path = path.as_str(), "loaded persona prompt from file");
            return Ok(content.trim().to_string());
        }
        warn!(path = path.as_str(), "persona prompt file is empty, falling back");
    }

    if let Some(prompt) = config.persona_prompt.as_deref().map(str::trim)
        && !prompt.is_empty()
    {
        return Ok(prompt.to_string());
    }

    Ok(DEFAULT_PERSONA.to_string())
}

#[cfg(test)]
mod tests {
    use persona_core::ChatRole;

    use super::*;

    #[test]
    fn minimal_prompt_is_persona_then_user() {
        let builder = PromptBuilder::new("Kamu adalah Rina.");
        let messages = builder.build("halo", None, &[]);
        assert_eq!(
            messages,
            vec![ChatTurn::system("Kamu adalah Rina."), ChatTurn::user("halo")]
        );
    }

    #[test]
    fn context_and_history_are_placed_in_order() {
        let builder = PromptBuilder::default();
        let history = vec![ChatTurn::user("pagi"), ChatTurn::assistant("pagi juga")];
        let messages = builder.build("lagi apa?", Some("[1] (Adit): lagi ngopi"), &history);

        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::System,
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User
            ]
        );
        assert!(messages[1].content.contains("[1] (Adit): lagi ngopi"));
        assert!(messages[1].content.contains("your own memories"));
        assert_eq!(messages[4].content, "lagi apa?");
    }

    #[test]
    fn blank_context_is_ignored() {
        let messages = PromptBuilder::default().build("halo", Some("  \n"), &[]);
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn persona_can_be_swapped() {
        let mut builder = PromptBuilder::default();
        builder.set_persona("Kamu adalah Budi.");
        assert_eq!(builder.build("x", None, &[])[0].content, "Kamu adalah Budi.");
    }

    #[tokio::test]
    async fn persona_file_wins_over_inline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.txt");
        tokio::fs::write(&path, "  Dari file.  \n").await.unwrap();

        let config = AgentConfig {
            persona_prompt: Some("Inline.".into()),
            persona_prompt_file: Some(path.display().to_string()),
            ..Default::default()
        };
        assert_eq!(load_persona_prompt(&config).await.unwrap(), "Dari file.");
    }

    #[tokio::test]
    async fn empty_file_falls_back_to_inline_then_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.txt");
        tokio::fs::write(&path, " \n").await.unwrap();

        let config = AgentConfig {
            persona_prompt: Some("Inline.".into()),
            persona_prompt_file: Some(path.display().to_string()),
            ..Default::default()
        };
        assert_eq!(load_persona_prompt(&config).await.unwrap(), "Inline.");

        let config = AgentConfig::default();
        assert_eq!(load_persona_prompt(&config).await.unwrap(), DEFAULT_PERSONA);
    }

    #[tokio::test]
    async fn unreadable_file_is_an_io_error() {
        let config = AgentConfig {
            persona_prompt: Some("Inline.".into()),
            persona_prompt_file: Some("/nonexistent/persona.txt".into()),
            ..Default::default()
        };
        let err = load_persona_prompt(&config).await.unwrap_err();
        assert!(matches!(err, PersonaError::Io { .. }));
    }
}
