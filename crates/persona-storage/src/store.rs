// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge store: CRUD over the `knowledge` table and BM25 search over
//! its FTS5 index.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use persona_core::{
    AdapterType, HealthStatus, KnowledgeEntry, NewKnowledgeEntry, PersonaError, PluginAdapter,
    SearchResult,
};

use crate::database::{Database, map_tr_err};

const ENTRY_COLUMNS: &str = "k.id, k.content, k.context, k.category, k.created_at";

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<KnowledgeEntry> {
    Ok(KnowledgeEntry {
        id: row.get(0)?,
        content: row.get(1)?,
        context: row.get(2)?,
        category: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn insert_row(conn: &rusqlite::Connection, entry: &NewKnowledgeEntry) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO knowledge (content, context, category) VALUES (?1, ?2, ?3)",
        params![entry.content, entry.context, entry.category],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Persistent, full-text searchable store of knowledge entries.
///
/// Every write goes through the `knowledge` table; triggers keep
/// `knowledge_fts` consistent, so an inserted row is searchable as soon as
/// the call returns and a deleted row disappears from results immediately.
#[derive(Clone)]
pub struct KnowledgeStore {
    db: Database,
}

impl KnowledgeStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the store at `path`, creating and migrating it if needed.
    pub async fn open(path: impl AsRef<std::path::Path>, wal_mode: bool) -> Result<Self, PersonaError> {
        Ok(Self::new(Database::open(path, wal_mode).await?))
    }

    /// Underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Opens a throwaway in-memory store.
    pub async fn open_in_memory() -> Result<Self, PersonaError> {
        Ok(Self::new(Database::open_in_memory().await?))
    }

    /// Inserts one entry and returns its id.
    pub async fn insert(&self, entry: NewKnowledgeEntry) -> Result<i64, PersonaError> {
        if entry.content.trim().is_empty() {
            return Err(PersonaError::InvalidInput(
                "knowledge content must not be empty".into(),
            ));
        }
        let id = self
            .db
            .connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> { insert_row(conn, &entry) })
            .await
            .map_err(map_tr_err)?;
        debug!(id, "knowledge entry inserted");
        Ok(id)
    }

    /// Inserts all entries in one transaction. Either every entry is stored
    /// or none is.
    pub async fn insert_batch(&self, entries: Vec<NewKnowledgeEntry>) -> Result<usize, PersonaError> {
        self.write_batch(entries, false).await
    }

    /// Deletes every entry and inserts `entries`, atomically.
    pub async fn replace_all(&self, entries: Vec<NewKnowledgeEntry>) -> Result<usize, PersonaError> {
        self.write_batch(entries, true).await
    }

    async fn write_batch(
        &self,
        entries: Vec<NewKnowledgeEntry>,
        clear_first: bool,
    ) -> Result<usize, PersonaError> {
        let count = self
            .db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                let tx = conn.transaction()?;
                if clear_first {
                    tx.execute("DELETE FROM knowledge", [])?;
                }
                for entry in &entries {
                    insert_row(&tx, entry)?;
                }
                tx.commit()?;
                Ok(entries.len())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(count, clear_first, "knowledge batch committed");
        Ok(count)
    }

    /// Runs a full-text match expression and returns the best `limit` hits,
    /// most relevant first.
    ///
    /// A malformed expression fails the call; the store is left untouched.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, PersonaError> {
        if query.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let query = query.to_string();
        let limit = limit as i64;
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<SearchResult>, rusqlite::Error> {
                let sql = format!(
                    "SELECT {ENTRY_COLUMNS}, bm25(knowledge_fts) AS rank
                     FROM knowledge_fts
                     JOIN knowledge k ON k.id = knowledge_fts.rowid
                     WHERE knowledge_fts MATCH ?1
                     ORDER BY rank ASC
                     LIMIT ?2"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![query, limit], |row| {
                    Ok(SearchResult {
                        entry: row_to_entry(row)?,
                        relevance: row.get(5)?,
                    })
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// All entries, newest first.
    pub async fn get_all(&self) -> Result<Vec<KnowledgeEntry>, PersonaError> {
        self.db
            .connection()
            .call(|conn| -> Result<Vec<KnowledgeEntry>, rusqlite::Error> {
                let sql = format!(
                    "SELECT {ENTRY_COLUMNS} FROM knowledge k ORDER BY k.created_at DESC, k.id DESC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], row_to_entry)?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<KnowledgeEntry>, PersonaError> {
        self.db
            .connection()
            .call(move |conn| -> Result<Option<KnowledgeEntry>, rusqlite::Error> {
                let sql = format!("SELECT {ENTRY_COLUMNS} FROM knowledge k WHERE k.id = ?1");
                conn.query_row(&sql, params![id], row_to_entry).optional()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Up to `count` entries drawn uniformly at random.
    pub async fn sample(&self, count: usize) -> Result<Vec<KnowledgeEntry>, PersonaError> {
        let count = count as i64;
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<KnowledgeEntry>, rusqlite::Error> {
                let sql =
                    format!("SELECT {ENTRY_COLUMNS} FROM knowledge k ORDER BY RANDOM() LIMIT ?1");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![count], row_to_entry)?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Removes one entry. Returns `false` if no entry had that id.
    pub async fn delete(&self, id: i64) -> Result<bool, PersonaError> {
        let removed = self
            .db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute("DELETE FROM knowledge WHERE id = ?1", params![id])
            })
            .await
            .map_err(map_tr_err)?;
        Ok(removed > 0)
    }

    pub async fn count(&self) -> Result<u64, PersonaError> {
        self.db
            .connection()
            .call(|conn| -> Result<u64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM knowledge", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)
    }

    /// Deletes every entry and returns how many were removed.
    pub async fn clear(&self) -> Result<usize, PersonaError> {
        let removed = self
            .db
            .connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute("DELETE FROM knowledge", [])
            })
            .await
            .map_err(map_tr_err)?;
        debug!(removed, "knowledge store cleared");
        Ok(removed)
    }
}

#[async_trait]
impl PluginAdapter for KnowledgeStore {
    fn name(&self) -> &str {
        "sqlite-knowledge"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PersonaError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PersonaError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!("knowledge store checkpointed");
        Ok(())
    }
}
