//! Repository layer for persisting preference records to SQLite

pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;
