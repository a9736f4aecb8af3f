// Property tests for type casting, truthiness and overlay resolution

mod common;

use proptest::prelude::*;

use common::{persisted_user, registry, root};
use prefset_core::{MemoryStore, PrefValue, ValueType};

fn scalar() -> impl Strategy<Value = PrefValue> {
    prop_oneof![
        Just(PrefValue::Null),
        any::<bool>().prop_map(PrefValue::Boolean),
        any::<i64>().prop_map(PrefValue::Integer),
        (-1.0e9f64..1.0e9).prop_map(PrefValue::Float),
        "[ a-zA-Z0-9+.-]{0,12}".prop_map(PrefValue::String),
    ]
}

fn value_type() -> impl Strategy<Value = ValueType> {
    prop_oneof![
        Just(ValueType::Boolean),
        Just(ValueType::Integer),
        Just(ValueType::Float),
        Just(ValueType::String),
        Just(ValueType::Any),
    ]
}

proptest! {
    #[test]
    fn cast_is_idempotent(value_type in value_type(), value in scalar()) {
        let once = value_type.cast(&value);
        prop_assert_eq!(value_type.cast(&once), once);
    }

    #[test]
    fn any_never_coerces(value in scalar()) {
        prop_assert_eq!(ValueType::Any.cast(&value), value);
    }

    #[test]
    fn null_is_never_truthy(value_type in value_type()) {
        prop_assert!(!value_type.truthiness(&PrefValue::Null));
    }

    #[test]
    fn integer_truthiness_is_non_zero(n in any::<i64>()) {
        prop_assert_eq!(ValueType::Integer.truthiness(&PrefValue::Integer(n)), n != 0);
        prop_assert_eq!(
            ValueType::Integer.truthiness(&PrefValue::String(n.to_string())),
            n != 0
        );
    }

    #[test]
    fn boolean_cast_yields_boolean_or_null(value in scalar()) {
        let cast = ValueType::Boolean.cast(&value);
        prop_assert!(matches!(cast, PrefValue::Boolean(_) | PrefValue::Null));
    }

    #[test]
    fn set_then_get_returns_cast_value(n in any::<i64>(), text in "[a-z]{1,10}") {
        let registry = registry();
        let store = MemoryStore::new();
        let mut user = persisted_user(&registry, "prop");

        user.set(&store, "age", n.to_string(), &root()).unwrap();
        user.set(&store, "language", text.clone(), &root()).unwrap();

        prop_assert_eq!(user.get(&store, "age", &root()).unwrap(), PrefValue::Integer(n));
        prop_assert_eq!(user.get(&store, "language", &root()).unwrap(), PrefValue::String(text));
    }

    #[test]
    fn reset_restores_pre_write_value(n in any::<i64>()) {
        let registry = registry();
        let store = MemoryStore::new();
        let mut user = persisted_user(&registry, "prop");
        let before = user.get(&store, "age", &root()).unwrap();

        user.set(&store, "age", PrefValue::Integer(n), &root()).unwrap();
        user.reset();

        prop_assert_eq!(user.get(&store, "age", &root()).unwrap(), before);
        prop_assert!(!user.is_dirty());
    }

    #[test]
    fn flush_writes_one_record_per_changed_key(values in proptest::collection::vec(1i64..1000, 1..8)) {
        let registry = registry();
        let mut store = MemoryStore::new();
        let mut user = persisted_user(&registry, "prop");

        for value in &values {
            user.set(&store, "age", PrefValue::Integer(*value), &root()).unwrap();
            user.flush(&mut store).unwrap();
        }

        prop_assert_eq!(store.len(), 1);
        let last = values.last().copied().unwrap_or_default();
        prop_assert_eq!(&store.records()[0].value, &PrefValue::Integer(last));
    }
}
