// Integration tests for the parameterized query-by-preference filter

mod common;

use common::{registry, seed, setup_store};
use prefset_core::{MemoryStore, PreferenceFilter, PreferenceStore, Scope};
use prefset_store::SqlitePreferenceStore;

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// Users 1..=5: 1 untouched, 2 Latin, 3 explicit English, 4 notifications
/// off with a blue car color, 5 Latin with notifications off
fn populated() -> SqlitePreferenceStore {
    let mut store = setup_store();
    seed(&mut store, "2", "language", Scope::Root, "Latin".into());
    seed(&mut store, "3", "language", Scope::Root, "English".into());
    seed(&mut store, "4", "notifications", Scope::Root, false.into());
    seed(&mut store, "4", "color", Scope::label("car"), "blue".into());
    seed(&mut store, "5", "language", Scope::Root, "Latin".into());
    seed(&mut store, "5", "notifications", Scope::Root, false.into());
    store
}

fn everyone() -> Vec<String> {
    ids(&["1", "2", "3", "4", "5"])
}

#[test]
fn test_default_matches_owners_without_records() {
    let registry = registry();
    let store = populated();

    let matched = PreferenceFilter::new(&registry, "User")
        .unwrap()
        .with("language", "English")
        .unwrap()
        .apply(&store, &everyone())
        .unwrap();

    assert_eq!(matched, ids(&["1", "3", "4"]));
}

#[test]
fn test_stored_value_match() {
    let registry = registry();
    let store = populated();

    let matched = PreferenceFilter::new(&registry, "User")
        .unwrap()
        .with("language", "Latin")
        .unwrap()
        .apply(&store, &everyone())
        .unwrap();

    assert_eq!(matched, ids(&["2", "5"]));
}

#[test]
fn test_inverse_and_combined_predicates() {
    let registry = registry();
    let store = populated();

    let matched = PreferenceFilter::new(&registry, "User")
        .unwrap()
        .without("language", "English")
        .unwrap()
        .with("notifications", "1")
        .unwrap()
        .apply(&store, &everyone())
        .unwrap();

    assert_eq!(matched, ids(&["2"]));
}

#[test]
fn test_scoped_predicates() {
    let registry = registry();
    let store = populated();

    let black_cars = PreferenceFilter::new(&registry, "User")
        .unwrap()
        .with_scoped(Scope::label("car"), "color", "black")
        .unwrap()
        .apply(&store, &everyone())
        .unwrap();
    assert_eq!(black_cars, ids(&["1", "2", "3", "5"]));

    let not_black = PreferenceFilter::new(&registry, "User")
        .unwrap()
        .without_scoped(Scope::label("car"), "color", "black")
        .unwrap()
        .apply(&store, &everyone())
        .unwrap();
    assert_eq!(not_black, ids(&["4"]));
}

#[test]
fn test_candidate_order_preserved_and_hostile_ids_bound() {
    let registry = registry();
    let store = populated();
    let candidates = ids(&["5", "x' OR '1'='1", "2"]);

    let matched = PreferenceFilter::new(&registry, "User")
        .unwrap()
        .with("language", "Latin")
        .unwrap()
        .apply(&store, &candidates)
        .unwrap();

    assert_eq!(matched, ids(&["5", "2"]));
    assert_eq!(store.count(None).unwrap(), 6);
}

#[test]
fn test_empty_candidates() {
    let registry = registry();
    let store = populated();

    let matched = PreferenceFilter::new(&registry, "User")
        .unwrap()
        .with("language", "Latin")
        .unwrap()
        .apply(&store, &[])
        .unwrap();

    assert!(matched.is_empty());
}

#[test]
fn test_agrees_with_memory_store() {
    // Given: the same records in both stores
    let registry = registry();
    let sqlite = populated();
    let mut memory = MemoryStore::new();
    for owner in everyone() {
        let owner_ref = prefset_core::OwnerRef::new("User", owner.as_str());
        for scope in [Scope::Root, Scope::label("car")] {
            for record in sqlite.find_all(&owner_ref, &scope).unwrap() {
                memory.upsert(&record.key, &record.value).unwrap();
            }
        }
    }

    // When: the same filters run against both
    let filters = [
        ("language", "English", false),
        ("language", "Latin", true),
        ("notifications", "false", false),
        ("notifications", "true", true),
    ];

    // Then: they select the same owners
    for (name, value, negate) in filters {
        let filter = PreferenceFilter::new(&registry, "User").unwrap();
        let filter = if negate {
            filter.without(name, value).unwrap()
        } else {
            filter.with(name, value).unwrap()
        };
        assert_eq!(
            filter.apply(&sqlite, &everyone()).unwrap(),
            filter.apply(&memory, &everyone()).unwrap(),
            "filter {} {} {}",
            name,
            if negate { "!=" } else { "==" },
            value
        );
    }
}
