//! Database connection management
//!
//! Provides utilities for opening and managing SQLite connections

use crate::config::DatabaseConfig;
use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection with the default settings
pub fn configure(conn: &Connection) -> Result<()> {
    apply_pragmas(conn, &DatabaseConfig::default())
}

/// Open and configure the database a config describes
pub fn open_with_config(config: &DatabaseConfig) -> Result<Connection> {
    let conn = match &config.path {
        Some(path) => open(path)?,
        None => open_in_memory()?,
    };
    apply_pragmas(&conn, config)?;
    Ok(conn)
}

fn apply_pragmas(conn: &Connection, config: &DatabaseConfig) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)
        .map_err(from_rusqlite)?;

    // journal_mode returns a row, so it cannot go through execute()
    if config.wal {
        let _mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
    }

    Ok(())
}
