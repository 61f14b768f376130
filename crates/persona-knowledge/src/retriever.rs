// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword retrieval over the knowledge store.
//!
//! Store failures never escape [`KnowledgeRetriever::retrieve`]; they are
//! logged and reported as `success = false` so the caller can fall back to
//! context-free generation.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use persona_core::{KnowledgeEntry, PersonaError, SearchResult};
use persona_storage::KnowledgeStore;

use crate::keywords::{extract_keywords, or_query};

/// Shown when an entry's provenance does not name a sender.
pub const UNKNOWN_SENDER: &str = "Unknown";

static SENDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"From chat with (.+?) at").unwrap());

/// Retrieved memory ready to be placed in a prompt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RetrievalResult {
    pub success: bool,
    /// `[n] (sender): content` blocks separated by blank lines.
    pub context: String,
    pub sources: Vec<SearchResult>,
}

impl RetrievalResult {
    fn empty() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }
}

/// Sender named in an entry's provenance note.
pub fn sender_of(entry: &KnowledgeEntry) -> &str {
    entry
        .context
        .as_deref()
        .and_then(|ctx| SENDER_PATTERN.captures(ctx))
        .and_then(|caps| caps.get(1))
        .map_or(UNKNOWN_SENDER, |m| m.as_str())
}

/// Formats search hits as numbered memory blocks.
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] ({}): {}", i + 1, sender_of(&r.entry), r.entry.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct KnowledgeRetriever {
    store: Arc<KnowledgeStore>,
}

impl KnowledgeRetriever {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    /// Finds up to `limit` entries relevant to `query`.
    pub async fn retrieve(&self, query: &str, limit: usize) -> RetrievalResult {
        let keywords = extract_keywords(query);
        if keywords.is_empty() {
            debug!("no keywords in query, skipping retrieval");
            return RetrievalResult::empty();
        }

        match self.store.search(&or_query(&keywords), limit).await {
            Ok(sources) => {
                debug!(keywords = ?keywords, hits = sources.len(), "retrieved knowledge");
                RetrievalResult {
                    success: true,
                    context: format_context(&sources),
                    sources,
                }
            }
            Err(e) => {
                warn!(error = %e, "knowledge retrieval failed, continuing without context");
                RetrievalResult::default()
            }
        }
    }

    /// Raw search hits for messages resembling `message`.
    pub async fn similar(&self, message: &str, limit: usize) -> Result<Vec<SearchResult>, PersonaError> {
        let keywords = extract_keywords(message);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        self.store.search(&or_query(&keywords), limit).await
    }

    /// Up to `count` distinct entries picked uniformly at random.
    pub async fn random_examples(&self, count: usize) -> Result<Vec<KnowledgeEntry>, PersonaError> {
        self.store.sample(count).await
    }
}

#[cfg(test)]
mod tests {
    use persona_core::NewKnowledgeEntry;
    use tracing_test::traced_test;

    use super::*;

    async fn retriever() -> KnowledgeRetriever {
        let store = KnowledgeStore::open_in_memory().await.unwrap();
        KnowledgeRetriever::new(Arc::new(store))
    }

    #[tokio::test]
    async fn formats_sender_from_provenance() {
        let retriever = retriever().await;
        retriever
            .store()
            .insert(
                NewKnowledgeEntry::new("nonton film bagus banget", "imported_chat")
                    .with_context("From chat with Adit at 01/01/24, 10:00"),
            )
            .await
            .unwrap();

        let result = retriever.retrieve("film apa yang bagus", 5).await;
        assert!(result.success);
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.context, "[1] (Adit): nonton film bagus banget");
    }

    #[tokio::test]
    async fn stop_word_query_is_a_successful_no_op() {
        let retriever = retriever().await;
        let result = retriever.retrieve("yang dan di ?!", 5).await;
        assert_eq!(result, RetrievalResult::empty());
    }

    #[tokio::test]
    async fn no_hits_gives_empty_context() {
        let retriever = retriever().await;
        let result = retriever.retrieve("astronomi", 5).await;
        assert!(result.success);
        assert!(result.context.is_empty());
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn multiple_hits_are_numbered_and_separated() {
        let retriever = retriever().await;
        let store = retriever.store();
        store
            .insert(NewKnowledgeEntry::new("suka kopi hitam", "manual"))
            .await
            .unwrap();
        store
            .insert(
                NewKnowledgeEntry::new("kopi susu enak", "imported_chat")
                    .with_context("From chat with Sari at 02/02/24, 08:00"),
            )
            .await
            .unwrap();

        let result = retriever.retrieve("kopi", 5).await;
        assert_eq!(result.sources.len(), 2);
        let blocks: Vec<_> = result.context.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("[1] ("));
        assert!(blocks[1].starts_with("[2] ("));
        assert!(result.context.contains("(Unknown): suka kopi hitam"));
        assert!(result.context.contains("(Sari): kopi susu enak"));
    }

    #[tokio::test]
    async fn operator_words_are_searched_literally() {
        let retriever = retriever().await;
        retriever
            .store()
            .insert(NewKnowledgeEntry::new("not near here", "manual"))
            .await
            .unwrap();
        let result = retriever.retrieve("not near", 5).await;
        assert!(result.success);
        assert_eq!(result.sources.len(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn store_failure_degrades() {
        let retriever = retriever().await;
        retriever
            .store()
            .database()
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("DROP TABLE knowledge_fts;")
            })
            .await
            .unwrap();

        let result = retriever.retrieve("film bagus", 5).await;
        assert!(!result.success);
        assert!(result.context.is_empty());
        assert!(result.sources.is_empty());
        assert!(logs_contain("knowledge retrieval failed"));
    }

    #[tokio::test]
    async fn similar_and_random_examples() {
        let retriever = retriever().await;
        for text in ["main bola sore", "bola basket", "masak nasi"] {
            retriever
                .store()
                .insert(NewKnowledgeEntry::new(text, "manual"))
                .await
                .unwrap();
        }
        assert_eq!(retriever.similar("bola", 3).await.unwrap().len(), 2);
        assert!(retriever.similar("?!", 3).await.unwrap().is_empty());

        let examples = retriever.random_examples(2).await.unwrap();
        assert_eq!(examples.len(), 2);
        assert_ne!(examples[0].id, examples[1].id);
    }

    #[test]
    fn sender_defaults_to_unknown() {
        let entry = KnowledgeEntry {
            id: 1,
            content: "x".into(),
            context: Some("typed by hand".into()),
            category: "manual".into(),
            created_at: String::new(),
        };
        assert_eq!(sender_of(&entry), UNKNOWN_SENDER);
    }
}
