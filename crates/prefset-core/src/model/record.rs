use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scope::{EntityRef, Scope};
use super::value::PrefValue;

/// Identity of the entity that owns a set of preference records
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerRef {
    pub owner_type: String,
    pub owner_id: String,
}

impl OwnerRef {
    pub fn new(owner_type: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id: owner_id.into(),
        }
    }

    pub fn of<E: EntityRef + ?Sized>(entity: &E) -> Self {
        Self::new(entity.entity_type(), entity.entity_id())
    }
}

/// The uniqueness tuple of a preference record
///
/// `(owner_id, owner_type, name, group_id, group_type)`; stores hold at
/// most one record per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub owner: OwnerRef,
    pub name: String,
    pub scope: Scope,
}

impl RecordKey {
    pub fn new(owner: OwnerRef, name: impl Into<String>, scope: Scope) -> Self {
        Self {
            owner,
            name: name.into(),
            scope,
        }
    }
}

/// A persisted override value
///
/// `value` is stored raw and only cast through the definition on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub id: i64,
    pub key: RecordKey,
    pub value: PrefValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PreferenceRecord {
    /// Create an unsaved record with current timestamps
    pub fn new(id: i64, key: RecordKey, value: PrefValue) -> Self {
        let now = Utc::now();
        Self {
            id,
            key,
            value,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn scope(&self) -> &Scope {
        &self.key.scope
    }
}
