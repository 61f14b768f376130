// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation memory and prompt assembly.

pub mod history;
pub mod prompt;

pub use history::ConversationMemory;
pub use prompt::{DEFAULT_PERSONA, PromptBuilder, load_persona_prompt};
