//! Migration runner
//!
//! Applies migrations with checksums and idempotency. A migration whose
//! recorded checksum no longer matches the embedded SQL is an error.

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::{get_migrations, Migration};
use prefset_core::{log_op_end, log_op_error, log_op_start};
use rusqlite::{Connection, OptionalExtension};

/// Apply all pending migrations to the database
///
/// Returns how many migrations were applied by this call.
pub fn apply_migrations(conn: &mut Connection) -> Result<usize> {
    log_op_start!("apply_migrations");
    let start = std::time::Instant::now();

    let result = run(conn);
    match &result {
        Ok(applied) => {
            log_op_end!(
                "apply_migrations",
                duration_ms = start.elapsed().as_millis() as u64,
                migrations = *applied as u64
            );
        }
        Err(e) => {
            log_op_error!(
                "apply_migrations",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
        }
    }
    result
}

fn run(conn: &mut Connection) -> Result<usize> {
    create_schema_version_table(conn)?;

    let mut applied = 0;
    for migration in get_migrations() {
        if apply_migration(conn, &migration)? {
            applied += 1;
        }
    }
    Ok(applied)
}

/// Ids of the migrations recorded in `schema_version`, in application order
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT migration_id FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let ids = stmt
        .query_map([], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(from_rusqlite)?;
    Ok(ids)
}

/// Create the schema_version table if it doesn't exist
fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT NOT NULL
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

/// Apply a single migration unless already recorded; true if it ran
fn apply_migration(conn: &mut Connection, migration: &Migration) -> Result<bool> {
    let checksum = compute_checksum(migration.sql);

    let recorded: Option<String> = conn
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = ?1",
            [migration.id],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;

    if let Some(recorded) = recorded {
        if recorded != checksum {
            return Err(checksum_mismatch(migration.id, &recorded, &checksum));
        }
        return Ok(false);
    }

    let tx = conn.transaction().map_err(from_rusqlite)?;

    tx.execute_batch(migration.sql)
        .map_err(|e| migration_error(migration.id, &e.to_string()))?;

    let now = chrono::Utc::now().timestamp();
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?1, ?2, ?3)",
        rusqlite::params![migration.id, now, checksum],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;
    tracing::debug!(migration = migration.id, "applied migration");

    Ok(true)
}
