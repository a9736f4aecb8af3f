use std::collections::HashMap;

use chrono::Utc;

use crate::errors::Result;
use crate::model::{OwnerRef, PrefValue, PreferenceRecord, RecordKey, Scope};
use crate::ops::filter::FilterPredicate;

/// Persistence collaborator for preference records
///
/// Implementations enforce at most one record per [`RecordKey`]. Errors are
/// returned to callers exactly as produced; the overlay never wraps them.
pub trait PreferenceStore {
    /// Point lookup by the unique key
    fn find(&self, key: &RecordKey) -> Result<Option<PreferenceRecord>>;

    /// All records of one owner within one scope, ordered by name
    fn find_all(&self, owner: &OwnerRef, scope: &Scope) -> Result<Vec<PreferenceRecord>>;

    /// Find-or-create the record for `key` and save `value` into it
    fn upsert(&mut self, key: &RecordKey, value: &PrefValue) -> Result<PreferenceRecord>;

    /// Apply a batch of upserts, returning how many records were written
    ///
    /// Transactional stores override this so a failure leaves no write
    /// behind.
    fn upsert_all(&mut self, writes: &[(RecordKey, PrefValue)]) -> Result<usize> {
        for (key, value) in writes {
            self.upsert(key, value)?;
        }
        Ok(writes.len())
    }

    /// Candidate owner ids of `owner_type` for which every predicate holds
    ///
    /// Candidate order is preserved.
    fn filter_owners(
        &self,
        owner_type: &str,
        candidates: &[String],
        predicates: &[FilterPredicate],
    ) -> Result<Vec<String>>;
}

/// In-memory store for preference records
///
/// A simple HashMap-based store. Not thread-safe (no Arc/RwLock); designed
/// for single-threaded use and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<RecordKey, PreferenceRecord>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records ordered by id
    pub fn records(&self) -> Vec<&PreferenceRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Number of records held for one owner
    pub fn count_for(&self, owner: &OwnerRef) -> usize {
        self.records.keys().filter(|k| &k.owner == owner).count()
    }
}

impl PreferenceStore for MemoryStore {
    fn find(&self, key: &RecordKey) -> Result<Option<PreferenceRecord>> {
        Ok(self.records.get(key).cloned())
    }

    fn find_all(&self, owner: &OwnerRef, scope: &Scope) -> Result<Vec<PreferenceRecord>> {
        let mut records: Vec<_> = self
            .records
            .values()
            .filter(|r| &r.key.owner == owner && &r.key.scope == scope)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.key.name.cmp(&b.key.name));
        Ok(records)
    }

    fn upsert(&mut self, key: &RecordKey, value: &PrefValue) -> Result<PreferenceRecord> {
        if let Some(record) = self.records.get_mut(key) {
            record.value = value.clone();
            record.updated_at = Utc::now();
            return Ok(record.clone());
        }

        self.next_id += 1;
        let record = PreferenceRecord::new(self.next_id, key.clone(), value.clone());
        self.records.insert(key.clone(), record.clone());
        Ok(record)
    }

    fn filter_owners(
        &self,
        owner_type: &str,
        candidates: &[String],
        predicates: &[FilterPredicate],
    ) -> Result<Vec<String>> {
        Ok(candidates
            .iter()
            .filter(|owner_id| {
                let owner = OwnerRef::new(owner_type, owner_id.as_str());
                predicates.iter().all(|predicate| {
                    let key = RecordKey::new(owner.clone(), &predicate.name, predicate.scope.clone());
                    predicate.matches(self.records.get(&key).map(|r| &r.value))
                })
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(owner_id: &str, name: &str, scope: Scope) -> RecordKey {
        RecordKey::new(OwnerRef::new("User", owner_id), name, scope)
    }

    #[test]
    fn test_upsert_creates_then_updates() {
        let mut store = MemoryStore::new();
        let first = store.upsert(&key("1", "language", Scope::Root), &"Latin".into()).unwrap();
        let second = store.upsert(&key("1", "language", Scope::Root), &"Greek".into()).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.len(), 1);
        assert_eq!(second.value, PrefValue::from("Greek"));
    }

    #[test]
    fn test_scopes_are_distinct_keys() {
        let mut store = MemoryStore::new();
        store.upsert(&key("1", "color", Scope::Root), &"red".into()).unwrap();
        store.upsert(&key("1", "color", Scope::label("car")), &"black".into()).unwrap();
        store.upsert(&key("1", "color", Scope::entity("Car", "3")), &"blue".into()).unwrap();

        assert_eq!(store.len(), 3);
        let owner = OwnerRef::new("User", "1");
        assert_eq!(store.find_all(&owner, &Scope::label("car")).unwrap().len(), 1);
        assert_eq!(store.count_for(&owner), 3);
    }

    #[test]
    fn test_find_all_is_name_ordered() {
        let mut store = MemoryStore::new();
        store.upsert(&key("1", "zeta", Scope::Root), &1.into()).unwrap();
        store.upsert(&key("1", "alpha", Scope::Root), &2.into()).unwrap();

        let names: Vec<_> = store
            .find_all(&OwnerRef::new("User", "1"), &Scope::Root)
            .unwrap()
            .into_iter()
            .map(|r| r.key.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
