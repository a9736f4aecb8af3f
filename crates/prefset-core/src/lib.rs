//! prefset Core - typed per-record preferences with overlay resolution
//!
//! This crate provides:
//! - The preference value model and column-style type casting
//! - Preference definitions and the per-owning-type registry with inheritance
//! - Accessor tables replacing generated reader/query/writer methods
//! - The per-entity overlay resolver with dirty tracking and write-back
//! - The `PreferenceStore` persistence seam and an in-memory store
//! - Query-by-preference filters
//! - Lifecycle hooks plus the error and logging facilities

pub mod accessor;
pub mod errors;
pub mod hooks;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod policy;
pub mod registry;

pub use prefset_core_types;

// Re-export commonly used types
pub use accessor::PreferenceAccessor;
pub use errors::{ExError, ExErrorKind, PrefError, Result};
pub use model::{
    EntityRef, OwnerRef, PrefValue, PreferenceDefinition, PreferenceRecord, RecordKey, Scope,
    ValueType,
};
pub use ops::{
    AllPreferences, FilterPredicate, MemoryStore, PreferenceFilter, PreferenceOverlay,
    PreferenceStore,
};
pub use policy::{InvalidValue, InvalidValuePolicy};
pub use registry::PreferenceRegistry;
