// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! SQL files under `migrations/` are compiled in with `embed_migrations!`.
//! Refinery records applied versions in `refinery_schema_history`, so opening
//! an existing database never re-runs them.

use persona_core::PersonaError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Applies all pending migrations.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), PersonaError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(PersonaError::storage)?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(())
}
