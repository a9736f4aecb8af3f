//! SQLite repository implementation
//!
//! Reads and writes rows of the `preferences` table. Scope columns map as
//! root => (NULL, NULL), label => (NULL, label), entity => (id, type), with
//! `scope_kind` telling the three apart. Lookups compare the kind plus the
//! group columns through `IFNULL(.., '')` to match the unique index.

use chrono::{DateTime, TimeZone, Utc};
use prefset_core::errors::ExError;
use prefset_core::{FilterPredicate, OwnerRef, PrefValue, PreferenceRecord, RecordKey, Scope};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use crate::errors::{decode_error, encode_error, from_rusqlite, Result};

const SELECT_COLUMNS: &str =
    "id, owner_id, owner_type, name, group_id, group_type, value, created_at, updated_at";

/// SQLite repository for preference records
pub struct SqliteRepo;

impl SqliteRepo {
    /// Point lookup by unique key
    pub fn find(conn: &Connection, key: &RecordKey) -> Result<Option<PreferenceRecord>> {
        let (kind, group_id, group_type) = scope_params(&key.scope);
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM preferences
                     WHERE owner_id = ?1 AND owner_type = ?2 AND name = ?3 AND scope_kind = ?4
                       AND IFNULL(group_id, '') = ?5 AND IFNULL(group_type, '') = ?6",
                    SELECT_COLUMNS
                ),
                rusqlite::params![
                    key.owner.owner_id,
                    key.owner.owner_type,
                    key.name,
                    kind,
                    group_id,
                    group_type
                ],
                RawRecord::from_row,
            )
            .optional()
            .map_err(from_rusqlite)?;

        row.map(RawRecord::into_record).transpose()
    }

    /// Every record of one owner within one scope, ordered by name
    pub fn find_all(
        conn: &Connection,
        owner: &OwnerRef,
        scope: &Scope,
    ) -> Result<Vec<PreferenceRecord>> {
        let (kind, group_id, group_type) = scope_params(scope);
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM preferences
                 WHERE owner_id = ?1 AND owner_type = ?2 AND scope_kind = ?3
                   AND IFNULL(group_id, '') = ?4 AND IFNULL(group_type, '') = ?5
                 ORDER BY name",
                SELECT_COLUMNS
            ))
            .map_err(from_rusqlite)?;

        let rows = stmt
            .query_map(
                rusqlite::params![owner.owner_id, owner.owner_type, kind, group_id, group_type],
                RawRecord::from_row,
            )
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        rows.into_iter().map(RawRecord::into_record).collect()
    }

    /// Find-or-create the row for `key` and store `value` in it
    ///
    /// Pass a `Transaction` (it derefs to `Connection`) to make several
    /// upserts atomic.
    pub fn upsert(conn: &Connection, key: &RecordKey, value: &PrefValue) -> Result<PreferenceRecord> {
        let encoded = value.to_json().map_err(ExError::from)?;
        let now = Utc::now();

        match Self::find(conn, key)? {
            Some(mut record) => {
                conn.execute(
                    "UPDATE preferences SET value = ?1, updated_at = ?2 WHERE id = ?3",
                    rusqlite::params![encoded, now.timestamp_millis(), record.id],
                )
                .map_err(from_rusqlite)?;
                record.value = value.clone();
                record.updated_at = now;
                Ok(record)
            }
            None => {
                conn.execute(
                    "INSERT INTO preferences
                        (owner_id, owner_type, name, scope_kind, group_id, group_type,
                         value, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                    rusqlite::params![
                        key.owner.owner_id,
                        key.owner.owner_type,
                        key.name,
                        scope_kind(&key.scope),
                        key.scope.group_id(),
                        key.scope.group_type(),
                        encoded,
                        now.timestamp_millis(),
                    ],
                )
                .map_err(from_rusqlite)?;
                Ok(PreferenceRecord {
                    id: conn.last_insert_rowid(),
                    key: key.clone(),
                    value: value.clone(),
                    created_at: now,
                    updated_at: now,
                })
            }
        }
    }

    /// Apply a batch of upserts in one transaction
    ///
    /// Any failure rolls back every write of the batch.
    pub fn upsert_all(conn: &mut Connection, writes: &[(RecordKey, PrefValue)]) -> Result<usize> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        for (key, value) in writes {
            Self::upsert(&tx, key, value)?;
        }
        tx.commit().map_err(from_rusqlite)?;
        Ok(writes.len())
    }

    /// Number of stored records, optionally for one owner
    pub fn count(conn: &Connection, owner: Option<&OwnerRef>) -> Result<usize> {
        let count: i64 = match owner {
            Some(owner) => conn.query_row(
                "SELECT COUNT(*) FROM preferences WHERE owner_id = ?1 AND owner_type = ?2",
                rusqlite::params![owner.owner_id, owner.owner_type],
                |row| row.get(0),
            ),
            None => conn.query_row("SELECT COUNT(*) FROM preferences", [], |row| row.get(0)),
        }
        .map_err(from_rusqlite)?;
        Ok(count as usize)
    }

    /// Candidates of `owner_type` for which every predicate holds
    ///
    /// One LEFT JOIN per predicate, all values bound as parameters. An
    /// owner satisfies a predicate when the joined row holds the requested
    /// value, or when no row exists and the default equals it.
    pub fn filter_owners(
        conn: &Connection,
        owner_type: &str,
        candidates: &[String],
        predicates: &[FilterPredicate],
    ) -> Result<Vec<String>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let (sql, params) = build_filter_query(owner_type, candidates, predicates)?;
        tracing::debug!(
            owner_type,
            predicates = predicates.len(),
            candidates = candidates.len(),
            "filter owners"
        );

        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let ids = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(from_rusqlite)?;
        Ok(ids)
    }
}

/// Fixed join template, one instance per predicate
///
/// Aliases are derived from the predicate's position; every caller-supplied
/// string travels as a bound parameter.
fn build_filter_query(
    owner_type: &str,
    candidates: &[String],
    predicates: &[FilterPredicate],
) -> Result<(String, Vec<Value>)> {
    let candidates_json = serde_json::to_string(candidates).map_err(|e| encode_error("candidates", e))?;
    let mut params = vec![Value::Text(candidates_json), Value::Text(owner_type.to_string())];
    let mut joins = String::new();
    let mut conditions = Vec::with_capacity(predicates.len());

    for (i, predicate) in predicates.iter().enumerate() {
        let (kind, group_id, group_type) = scope_params(&predicate.scope);
        let base = params.len();
        params.push(Value::Text(predicate.name.clone()));
        params.push(Value::Integer(kind));
        params.push(Value::Text(group_id.to_string()));
        params.push(Value::Text(group_type.to_string()));
        params.push(Value::Text(predicate.value.to_json().map_err(ExError::from)?));
        params.push(Value::Integer(i64::from(predicate.default_matches)));

        joins.push_str(&format!(
            " LEFT JOIN preferences p{i} ON p{i}.owner_type = ?2 AND p{i}.owner_id = c.value \
             AND p{i}.name = ?{} AND p{i}.scope_kind = ?{} \
             AND IFNULL(p{i}.group_id, '') = ?{} AND IFNULL(p{i}.group_type, '') = ?{}",
            base + 1,
            base + 2,
            base + 3,
            base + 4,
        ));

        let matched = format!(
            "((p{i}.id IS NOT NULL AND p{i}.value = ?{}) OR (p{i}.id IS NULL AND ?{}))",
            base + 5,
            base + 6,
        );
        conditions.push(if predicate.negate {
            format!("NOT {}", matched)
        } else {
            matched
        });
    }

    let mut sql = format!("SELECT c.value FROM json_each(?1) AS c{}", joins);
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY c.key");
    Ok((sql, params))
}

/// Discriminator stored in `scope_kind`
fn scope_kind(scope: &Scope) -> i64 {
    match scope {
        Scope::Root => 0,
        Scope::Label(_) => 1,
        Scope::Entity { .. } => 2,
    }
}

/// `(scope_kind, group_id, group_type)` as compared through `IFNULL(.., '')`
fn scope_params(scope: &Scope) -> (i64, &str, &str) {
    (
        scope_kind(scope),
        scope.group_id().unwrap_or_default(),
        scope.group_type().unwrap_or_default(),
    )
}

/// Row as read, before JSON decoding and scope reconstruction
struct RawRecord {
    id: i64,
    owner_id: String,
    owner_type: String,
    name: String,
    group_id: Option<String>,
    group_type: Option<String>,
    value: String,
    created_at: i64,
    updated_at: i64,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            owner_type: row.get(2)?,
            name: row.get(3)?,
            group_id: row.get(4)?,
            group_type: row.get(5)?,
            value: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<PreferenceRecord> {
        let scope = Scope::from_parts(self.group_id, self.group_type).map_err(ExError::from)?;
        let value: PrefValue =
            serde_json::from_str(&self.value).map_err(|e| decode_error("value", e))?;
        Ok(PreferenceRecord {
            id: self.id,
            key: RecordKey::new(OwnerRef::new(self.owner_type, self.owner_id), self.name, scope),
            value,
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
        })
    }
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicate(name: &str, negate: bool) -> FilterPredicate {
        FilterPredicate {
            name: name.to_string(),
            scope: Scope::label("car"),
            value: PrefValue::from("black"),
            default_matches: true,
            negate,
        }
    }

    #[test]
    fn test_filter_query_binds_every_value() {
        let candidates = vec!["1".to_string(), "x'); DROP TABLE preferences; --".to_string()];
        let (sql, params) = build_filter_query(
            "User",
            &candidates,
            &[predicate("color", false), predicate("language", true)],
        )
        .unwrap();

        assert!(!sql.contains("DROP"));
        assert!(!sql.contains("User"));
        assert!(!sql.contains("color"));
        assert_eq!(params.len(), 2 + 2 * 6);
        assert!(sql.contains("LEFT JOIN preferences p0"));
        assert!(sql.contains("LEFT JOIN preferences p1"));
        assert!(sql.contains("NOT ((p1.id IS NOT NULL"));
    }

    #[test]
    fn test_filter_query_without_predicates_has_no_where() {
        let (sql, params) = build_filter_query("User", &["1".to_string()], &[]).unwrap();

        assert!(!sql.contains("WHERE"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_scope_params() {
        assert_eq!(scope_params(&Scope::Root), (0, "", ""));
        assert_eq!(scope_params(&Scope::label("car")), (1, "", "car"));
        assert_eq!(scope_params(&Scope::entity("Car", "9")), (2, "9", "Car"));
        assert_ne!(scope_params(&Scope::label("")), scope_params(&Scope::Root));
        assert_ne!(
            scope_params(&Scope::entity("Car", "")),
            scope_params(&Scope::label("Car"))
        );
    }
}
