// Integration tests for the migration framework

use prefset_core::errors::ExErrorKind;
use prefset_store::migrations::{applied_migrations, apply_migrations, get_migrations};
use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    // Given: An empty SQLite database
    let mut conn = setup_test_db();

    // When: Migrations are applied
    let applied = apply_migrations(&mut conn).unwrap();

    // Then: Every embedded migration ran and the schema exists
    assert_eq!(applied, get_migrations().len());
    let tables = get_table_names(&conn);
    for expected in ["preferences", "schema_version", "sqlite_sequence"] {
        assert!(
            tables.contains(&expected.to_string()),
            "Missing table: {}",
            expected
        );
    }
}

#[test]
fn test_reapply_is_noop() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
    assert_eq!(
        applied_migrations(&conn).unwrap(),
        get_migrations().iter().map(|m| m.id).collect::<Vec<_>>()
    );
}

#[test]
fn test_tampered_checksum_fails() {
    // Given: A migrated database whose recorded checksum was altered
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'deadbeef' WHERE migration_id = '001_preferences'",
        [],
    )
    .unwrap();

    // When: Migrations are applied again
    let err = apply_migrations(&mut conn).unwrap_err();

    // Then: The mismatch is reported
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    assert_eq!(err.op(), Some("migration_checksum"));
    assert!(err.message().contains("001_preferences"));
}

#[test]
fn test_unique_key_treats_null_scope_parts_as_equal() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    let insert = "INSERT INTO preferences
        (owner_id, owner_type, name, scope_kind, group_id, group_type, value, created_at, updated_at)
        VALUES ('1', 'User', 'language', 0, NULL, NULL, '\"Latin\"', 0, 0)";

    conn.execute(insert, []).unwrap();
    let err = conn.execute(insert, []).unwrap_err();

    assert_eq!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    );
}

#[test]
fn test_group_id_requires_group_type() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    let result = conn.execute(
        "INSERT INTO preferences
            (owner_id, owner_type, name, scope_kind, group_id, group_type, value, created_at, updated_at)
            VALUES ('1', 'User', 'color', 2, '7', NULL, '\"blue\"', 0, 0)",
        [],
    );

    assert!(result.is_err());
}

#[test]
fn test_scope_kind_must_match_group_columns() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    let insert = |kind: i64, group_id: Option<&str>, group_type: Option<&str>| {
        conn.execute(
            "INSERT INTO preferences
                (owner_id, owner_type, name, scope_kind, group_id, group_type, value, created_at, updated_at)
                VALUES ('1', 'User', 'color', ?1, ?2, ?3, '\"blue\"', 0, 0)",
            rusqlite::params![kind, group_id, group_type],
        )
    };

    // A root row cannot carry a label, a label row cannot carry an id
    assert!(insert(0, None, Some("car")).is_err());
    assert!(insert(1, Some("7"), Some("car")).is_err());

    // An empty label and an entity with an empty id are rows of their own
    insert(0, None, None).unwrap();
    insert(1, None, Some("")).unwrap();
    insert(1, None, Some("car")).unwrap();
    insert(2, Some(""), Some("car")).unwrap();
}
