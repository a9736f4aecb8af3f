use std::sync::Arc;

use prefset_core::errors::{ExError, ExErrorKind, Result};
use prefset_core::{
    FilterPredicate, MemoryStore, OwnerRef, PrefValue, PreferenceDefinition, PreferenceOverlay,
    PreferenceRecord, PreferenceRegistry, PreferenceStore, RecordKey, Scope, ValueType,
};

/// Registry with a `User` type and an `Admin` subtype
///
/// User: notifications (boolean, true), language (string, "English"),
/// age (integer, no default), theme (string, "light", light|dark),
/// color (string, "red", group default car => "black").
/// Admin: inherits User, overrides language default to "Latin", adds
/// audit_log (boolean, false).
#[allow(dead_code)]
pub fn registry() -> Arc<PreferenceRegistry> {
    Arc::new(build_registry())
}

#[allow(dead_code)]
pub fn build_registry() -> PreferenceRegistry {
    let mut registry = PreferenceRegistry::new();
    registry.register_type("User", None).unwrap();
    registry
        .register("User", PreferenceDefinition::boolean("notifications", true))
        .unwrap();
    registry
        .register(
            "User",
            PreferenceDefinition::new("language", ValueType::String).with_default("English"),
        )
        .unwrap();
    registry
        .register("User", PreferenceDefinition::new("age", ValueType::Integer))
        .unwrap();
    registry
        .register(
            "User",
            PreferenceDefinition::new("theme", ValueType::String)
                .with_default("light")
                .with_allowed_values(["light", "dark"]),
        )
        .unwrap();
    registry
        .register(
            "User",
            PreferenceDefinition::new("color", ValueType::String)
                .with_default("red")
                .with_group_default("car", "black"),
        )
        .unwrap();

    registry.register_type("Admin", Some("User")).unwrap();
    registry
        .register(
            "Admin",
            PreferenceDefinition::new("language", ValueType::String).with_default("Latin"),
        )
        .unwrap();
    registry
        .register("Admin", PreferenceDefinition::boolean("audit_log", false))
        .unwrap();
    registry
}

#[allow(dead_code)]
pub fn new_user(registry: &Arc<PreferenceRegistry>) -> PreferenceOverlay {
    PreferenceOverlay::new(Arc::clone(registry), "User").unwrap()
}

#[allow(dead_code)]
pub fn persisted_user(registry: &Arc<PreferenceRegistry>, id: &str) -> PreferenceOverlay {
    PreferenceOverlay::persisted(Arc::clone(registry), "User", id).unwrap()
}

#[allow(dead_code)]
pub fn root() -> Scope {
    Scope::Root
}

/// Seed a stored record directly, bypassing the overlay
#[allow(dead_code)]
pub fn seed(store: &mut MemoryStore, owner_id: &str, name: &str, scope: Scope, value: PrefValue) {
    let key = RecordKey::new(OwnerRef::new("User", owner_id), name, scope);
    store.upsert(&key, &value).unwrap();
}

/// Store wrapper that counts lookups and can be told to fail writes
#[allow(dead_code)]
#[derive(Default)]
pub struct ProbeStore {
    pub inner: MemoryStore,
    pub finds: std::cell::Cell<usize>,
    pub bulk_loads: std::cell::Cell<usize>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
pub fn write_failure() -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("upsert")
        .with_message("database is locked")
}

impl PreferenceStore for ProbeStore {
    fn find(&self, key: &RecordKey) -> Result<Option<PreferenceRecord>> {
        self.finds.set(self.finds.get() + 1);
        self.inner.find(key)
    }

    fn find_all(&self, owner: &OwnerRef, scope: &Scope) -> Result<Vec<PreferenceRecord>> {
        self.bulk_loads.set(self.bulk_loads.get() + 1);
        self.inner.find_all(owner, scope)
    }

    fn upsert(&mut self, key: &RecordKey, value: &PrefValue) -> Result<PreferenceRecord> {
        if self.fail_writes {
            return Err(write_failure().into());
        }
        self.inner.upsert(key, value)
    }

    fn upsert_all(&mut self, writes: &[(RecordKey, PrefValue)]) -> Result<usize> {
        if self.fail_writes {
            return Err(write_failure().into());
        }
        self.inner.upsert_all(writes)
    }

    fn filter_owners(
        &self,
        owner_type: &str,
        candidates: &[String],
        predicates: &[FilterPredicate],
    ) -> Result<Vec<String>> {
        self.inner.filter_owners(owner_type, candidates, predicates)
    }
}
