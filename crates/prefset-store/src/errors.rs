//! Error handling for prefset-store
//!
//! Wraps prefset-core ExError with store-specific helpers. Callers going
//! through `PreferenceStore` receive these as `PrefError::Persistence`.

use prefset_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
///
/// Constraint failures keep their own kind so callers can tell a
/// uniqueness clash from an unavailable database.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => ExErrorKind::ConstraintViolation,
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a stored-value decoding error
pub fn decode_error(column: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("decode_record")
        .with_message(format!("Invalid JSON in column {}: {}", column, err))
}

/// Create a query-parameter encoding error
pub fn encode_error(what: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("encode_params")
        .with_message(format!("Cannot encode {}: {}", what, err))
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a configuration error
pub fn config_error(reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_config")
        .with_message(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_failures_keep_their_kind() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER UNIQUE); INSERT INTO t VALUES (1);")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES (1)", []).unwrap_err();

        let ex = from_rusqlite(err);

        assert_eq!(ex.kind(), ExErrorKind::ConstraintViolation);
        assert_eq!(ex.op(), Some("sqlite"));
    }

    #[test]
    fn test_other_failures_are_persistence() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM missing", []).unwrap_err();

        assert_eq!(from_rusqlite(err).code(), "ERR_PERSISTENCE");
    }
}
