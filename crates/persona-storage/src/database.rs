// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup: PRAGMAs, WAL mode, and migrations.
//!
//! All statements run on tokio-rusqlite's single background thread, which
//! gives the store a single-writer model without extra locking.

use std::path::Path;

use persona_core::PersonaError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

/// Maps a tokio-rusqlite error into [`PersonaError::Storage`].
pub(crate) fn map_tr_err<E>(err: tokio_rusqlite::Error<E>) -> PersonaError
where
    E: std::error::Error + Send + Sync + 'static,
{
    PersonaError::storage(err)
}

/// Handle to an open, migrated knowledge database.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database file, creating parent directories.
    pub async fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, PersonaError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(PersonaError::storage)?;
        let db = Self::prepare(conn, wal_mode).await?;
        debug!(path = %path.display(), wal_mode, "knowledge database opened");
        Ok(db)
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, PersonaError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(PersonaError::storage)?;
        Self::prepare(conn, false).await
    }

    async fn prepare(conn: Connection, wal_mode: bool) -> Result<Self, PersonaError> {
        conn.call(move |conn| -> Result<(), PersonaError> {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(PersonaError::storage)?;
            }
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )
            .map_err(PersonaError::storage)?;
            run_migrations(conn)
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(inner) => inner,
            other => PersonaError::Internal(format!("database setup failed: {other}")),
        })?;
        Ok(Self { conn })
    }

    /// Returns the underlying async connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
