// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat export import flow.
//!
//! An export with more than one sender is only imported once the operator
//! names whose messages to keep. Without that choice the import is refused
//! and the per-sender statistics are returned instead.

use tracing::info;

use persona_core::PersonaError;
use persona_storage::KnowledgeStore;

use crate::parser::{self, ChatStats};

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Keep only this sender's messages (case-insensitive).
    pub sender: Option<String>,
    /// Replace the existing knowledge instead of appending to it.
    pub clear: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Entries were written.
    Imported { inserted: usize, total: u64 },
    /// Several senders were found and none was chosen.
    NeedsSender { stats: ChatStats },
    /// Nothing usable was left after parsing and filtering.
    NothingToImport { stats: ChatStats },
}

/// Parses `text` and stores the selected utterances.
pub async fn import_chat(
    store: &KnowledgeStore,
    text: &str,
    options: &ImportOptions,
) -> Result<ImportOutcome, PersonaError> {
    let utterances = parser::parse(text);
    let stats = parser::chat_stats(&utterances);
    info!(
        messages = stats.total_messages,
        senders = stats.unique_senders,
        "parsed chat export"
    );

    if options.sender.is_none() && stats.unique_senders > 1 {
        return Ok(ImportOutcome::NeedsSender { stats });
    }

    let entries = parser::convert_to_knowledge(&utterances, options.sender.as_deref());
    if entries.is_empty() {
        return Ok(ImportOutcome::NothingToImport { stats });
    }

    let inserted = if options.clear {
        store.replace_all(entries).await?
    } else {
        store.insert_batch(entries).await?
    };
    let total = store.count().await?;
    info!(inserted, total, cleared = options.clear, "chat export imported");

    Ok(ImportOutcome::Imported { inserted, total })
}
