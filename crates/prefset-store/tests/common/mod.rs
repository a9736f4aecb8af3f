use std::sync::Arc;

use prefset_core::{
    OwnerRef, PrefValue, PreferenceDefinition, PreferenceOverlay, PreferenceRegistry,
    PreferenceStore, RecordKey, Scope, ValueType,
};
use prefset_store::SqlitePreferenceStore;

/// `User` with notifications, language, age and a car-scoped color
#[allow(dead_code)]
pub fn registry() -> Arc<PreferenceRegistry> {
    let mut registry = PreferenceRegistry::new();
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
            PreferenceDefinition::new("color", ValueType::String)
                .with_default("red")
                .with_group_default("car", "black"),
        )
        .unwrap();
    Arc::new(registry)
}

#[allow(dead_code)]
pub fn setup_store() -> SqlitePreferenceStore {
    SqlitePreferenceStore::open_in_memory().expect("Failed to open in-memory store")
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
pub fn user_key(owner_id: &str, name: &str, scope: Scope) -> RecordKey {
    RecordKey::new(OwnerRef::new("User", owner_id), name, scope)
}

/// Write a record directly, bypassing the overlay
#[allow(dead_code)]
pub fn seed(store: &mut SqlitePreferenceStore, owner_id: &str, name: &str, scope: Scope, value: PrefValue) {
    store.upsert(&user_key(owner_id, name, scope), &value).unwrap();
}

#[allow(dead_code)]
pub fn count_for(store: &SqlitePreferenceStore, owner_id: &str) -> usize {
    store.count(Some(&OwnerRef::new("User", owner_id))).unwrap()
}
