// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `persona import`, `persona knowledge ...`, and `persona retrieve`.

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;

use persona_config::PersonaConfig;
use persona_core::{NewKnowledgeEntry, PersonaError};
use persona_knowledge::parser::ChatStats;
use persona_knowledge::retriever::sender_of;
use persona_knowledge::{
    ImportOptions, ImportOutcome, KnowledgeRetriever, extract_keywords, import_chat,
};
use persona_storage::{KnowledgeStore, open_store};

/// Category given to entries added by hand.
pub const MANUAL_CATEGORY: &str = "manual";

const PREVIEW_CHARS: usize = 80;

pub async fn run_import(
    config: &PersonaConfig,
    file: &Path,
    user: Option<String>,
    clear: bool,
) -> Result<(), PersonaError> {
    let text = tokio::fs::read_to_string(file).await?;
    let store = open_store(&config.storage).await?;

    let options = ImportOptions {
        sender: user,
        clear,
    };
    match import_chat(&store, &text, &options).await? {
        ImportOutcome::Imported { inserted, total } => {
            println!(
                "{} {inserted} entries from {}",
                "imported".green(),
                file.display()
            );
            println!("knowledge store now holds {total} entries");
        }
        ImportOutcome::NeedsSender { stats } => {
            print_stats(&stats);
            println!();
            println!(
                "{}",
                "Several senders found. Re-run with --user <NAME> to choose whose messages to import."
                    .yellow()
            );
        }
        ImportOutcome::NothingToImport { stats } => {
            print_stats(&stats);
            println!("{}", "nothing to import".yellow());
        }
    }
    Ok(())
}

fn print_stats(stats: &ChatStats) {
    println!(
        "{} messages from {} senders",
        stats.total_messages, stats.unique_senders
    );
    for sender in &stats.senders {
        println!("  {:<24} {}", sender.name, sender.count);
    }
}

pub async fn run_add(
    config: &PersonaConfig,
    content: String,
    context: Option<String>,
    category: String,
) -> Result<(), PersonaError> {
    let store = open_store(&config.storage).await?;
    let mut entry = NewKnowledgeEntry::new(content, category);
    if let Some(context) = context {
        entry = entry.with_context(context);
    }
    let id = store.insert(entry).await?;
    println!("{} entry #{id}", "added".green());
    Ok(())
}

pub async fn run_list(
    config: &PersonaConfig,
    limit: Option<usize>,
    json: bool,
) -> Result<(), PersonaError> {
    let store = open_store(&config.storage).await?;
    let mut entries = store.get_all().await?;
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if json {
        let rendered = serde_json::to_string_pretty(&entries)
            .map_err(|e| PersonaError::Internal(format!("failed to encode entries: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("knowledge store is empty");
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{:>6}  {}  {:<14} {}",
            format!("#{}", entry.id).bold(),
            entry.created_at.dimmed(),
            entry.category,
            preview(&entry.content)
        );
    }
    Ok(())
}

pub async fn run_delete(config: &PersonaConfig, id: i64) -> Result<(), PersonaError> {
    let store = open_store(&config.storage).await?;
    if store.delete(id).await? {
        println!("{} entry #{id}", "deleted".green());
        Ok(())
    } else {
        Err(PersonaError::InvalidInput(format!("no knowledge entry with id {id}")))
    }
}

pub async fn run_count(config: &PersonaConfig) -> Result<(), PersonaError> {
    let store = open_store(&config.storage).await?;
    println!("{}", store.count().await?);
    Ok(())
}

pub async fn run_clear(config: &PersonaConfig, yes: bool) -> Result<(), PersonaError> {
    if !yes {
        return Err(PersonaError::InvalidInput(
            "refusing to clear the knowledge store without --yes".to_string(),
        ));
    }
    let store = open_store(&config.storage).await?;
    let removed = store.clear().await?;
    println!("{} {removed} entries", "removed".green());
    Ok(())
}

pub async fn run_retrieve(
    config: &PersonaConfig,
    query: &str,
    limit: usize,
) -> Result<(), PersonaError> {
    let store: Arc<KnowledgeStore> = Arc::new(open_store(&config.storage).await?);
    let retriever = KnowledgeRetriever::new(store);

    let keywords = extract_keywords(query);
    println!("{} {}", "keywords:".bold(), keywords.join(", "));

    let result = retriever.retrieve(query, limit).await;
    if !result.success {
        return Err(PersonaError::Internal(
            "retrieval failed, see the log for details".to_string(),
        ));
    }
    if result.sources.is_empty() {
        println!("no matching knowledge");
        return Ok(());
    }

    for (i, source) in result.sources.iter().enumerate() {
        println!(
            "{} {} {} {}",
            format!("[{}]", i + 1).bold(),
            format!("#{}", source.entry.id).dimmed(),
            format!("({})", sender_of(&source.entry)).cyan(),
            format!("rank {:.3}", source.relevance).dimmed(),
        );
        println!("    {}", preview(&source.entry.content));
    }
    println!();
    println!("{}", "context sent to the model:".bold());
    println!("{}", result.context);
    Ok(())
}

/// First line of `content`, cut to a terminal-friendly width.
fn preview(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default();
    let mut preview: String = first_line.chars().take(PREVIEW_CHARS).collect();
    if first_line.chars().count() > PREVIEW_CHARS || content.lines().nth(1).is_some() {
        preview.push_str("...");
    }
    preview
}
