// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Persona knowledge base.
//!
//! Entries live in a plain `knowledge` table mirrored into an FTS5 index by
//! triggers. Writes are serialized through a single `tokio-rusqlite`
//! connection and batch writes run inside one transaction.

pub mod database;
pub mod migrations;
pub mod store;

use persona_config::model::StorageConfig;
use persona_core::PersonaError;

pub use database::Database;
pub use store::KnowledgeStore;

/// Opens the knowledge store described by the storage config section.
pub async fn open_store(config: &StorageConfig) -> Result<KnowledgeStore, PersonaError> {
    KnowledgeStore::open(&config.database_path, config.wal_mode).await
}
