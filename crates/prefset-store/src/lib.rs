//! prefset Store - SQLite persistence for preference records
//!
//! Provides:
//! - Connection management and the TOML configuration file
//! - SQLite schema with a checksummed migrations framework
//! - Repository functions for point, bulk and filter queries
//! - `SqlitePreferenceStore`, the `PreferenceStore` implementation

pub mod config;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod store;

// Re-export key types
pub use config::{DatabaseConfig, LoggingConfig, PrefsetConfig};
pub use errors::Result;
pub use store::SqlitePreferenceStore;
