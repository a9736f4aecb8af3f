//! SQLite-backed `PreferenceStore`
//!
//! Owns one migrated connection. Repository errors surface to the overlay
//! as `PrefError::Persistence` carrying the original `ExError`.

use prefset_core::errors::Result as PrefResult;
use prefset_core::logging_facility;
use prefset_core::{
    log_op_end, log_op_error, log_op_start, FilterPredicate, OwnerRef, PrefValue,
    PreferenceRecord, PreferenceStore, RecordKey, Scope,
};
use rusqlite::Connection;

use crate::config::PrefsetConfig;
use crate::db;
use crate::errors::Result;
use crate::migrations::apply_migrations;
use crate::repo::SqliteRepo;

#[derive(Debug)]
pub struct SqlitePreferenceStore {
    conn: Connection,
}

impl SqlitePreferenceStore {
    /// Wrap an open connection, applying pending migrations
    pub fn new(mut conn: Connection) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Open, configure and migrate the database a config describes
    ///
    /// Initializes logging with the configured profile first; a process
    /// that already initialized logging keeps its setup.
    pub fn open(config: &PrefsetConfig) -> Result<Self> {
        logging_facility::init(config.logging.profile);
        let location = config
            .database
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());
        log_op_start!("open_store", path = location.as_str());
        let start = std::time::Instant::now();

        let opened = db::open_with_config(&config.database).and_then(Self::new);
        match &opened {
            Ok(_) => {
                log_op_end!(
                    "open_store",
                    duration_ms = start.elapsed().as_millis() as u64,
                    path = location.as_str()
                );
            }
            Err(e) => {
                log_op_error!(
                    "open_store",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    path = location.as_str()
                );
            }
        }
        opened
    }

    /// Fresh in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        db::configure(&conn)?;
        Self::new(conn)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }

    /// Number of stored records, optionally for one owner
    pub fn count(&self, owner: Option<&OwnerRef>) -> Result<usize> {
        SqliteRepo::count(&self.conn, owner)
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn find(&self, key: &RecordKey) -> PrefResult<Option<PreferenceRecord>> {
        Ok(SqliteRepo::find(&self.conn, key)?)
    }

    fn find_all(&self, owner: &OwnerRef, scope: &Scope) -> PrefResult<Vec<PreferenceRecord>> {
        Ok(SqliteRepo::find_all(&self.conn, owner, scope)?)
    }

    fn upsert(&mut self, key: &RecordKey, value: &PrefValue) -> PrefResult<PreferenceRecord> {
        Ok(SqliteRepo::upsert(&self.conn, key, value)?)
    }

    fn upsert_all(&mut self, writes: &[(RecordKey, PrefValue)]) -> PrefResult<usize> {
        Ok(SqliteRepo::upsert_all(&mut self.conn, writes)?)
    }

    fn filter_owners(
        &self,
        owner_type: &str,
        candidates: &[String],
        predicates: &[FilterPredicate],
    ) -> PrefResult<Vec<String>> {
        Ok(SqliteRepo::filter_owners(
            &self.conn,
            owner_type,
            candidates,
            predicates,
        )?)
    }
}
