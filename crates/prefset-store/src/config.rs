//! Configuration file
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! a development-logging, in-memory database setup.

use std::path::{Path, PathBuf};

use prefset_core::logging_facility::Profile;
use serde::{Deserialize, Serialize};

use crate::errors::{config_error, io_error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrefsetConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database file; `None` opens an in-memory database
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
    /// WAL journal mode; ignored for in-memory databases
    #[serde(default = "default_true")]
    pub wal: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            foreign_keys: true,
            wal: true,
        }
    }
}

impl PrefsetConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// Returns an `ERR_CONFIG` error for malformed TOML or unknown keys.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| config_error(e.to_string()))
    }

    /// Read and parse a TOML file
    ///
    /// A relative `database.path` is resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an `ERR_IO` error if the file cannot be read and an
    /// `ERR_CONFIG` error if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| io_error("load_config", e))?;
        let mut config = Self::from_toml_str(&raw)?;

        if let (Some(db_path), Some(dir)) = (config.database.path.as_ref(), path.parent()) {
            if db_path.is_relative() {
                config.database.path = Some(dir.join(db_path));
            }
        }
        Ok(config)
    }
}
