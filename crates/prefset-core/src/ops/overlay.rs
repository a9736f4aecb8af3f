//! Per-entity preference overlay
//!
//! Resolution precedence is pending write > persisted record > default.
//! The overlay caches every value it resolves per scope, records the
//! pre-change baseline of each changed `(scope, name)` in a dirty set, and
//! writes only the dirty entries back when the owning entity is saved.
//!
//! An overlay belongs to exactly one entity instance and is not shared; it
//! does no locking of its own.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::accessor::PreferenceAccessor;
use crate::errors::{PrefError, Result};
use crate::model::{OwnerRef, PrefValue, PreferenceDefinition, RecordKey, Scope, ValueType};
use crate::ops::store::PreferenceStore;
use crate::policy::{InvalidValue, InvalidValuePolicy};
use crate::registry::PreferenceRegistry;

/// Snapshot returned by [`PreferenceOverlay::all_preferences`]
///
/// `scopes` is only populated for root-scope snapshots and holds every
/// other scope the overlay had already touched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllPreferences {
    pub values: BTreeMap<String, PrefValue>,
    pub scopes: BTreeMap<Scope, BTreeMap<String, PrefValue>>,
}

impl AllPreferences {
    pub fn get(&self, name: &str) -> Option<&PrefValue> {
        self.values.get(name)
    }

    pub fn scope(&self, scope: &Scope) -> Option<&BTreeMap<String, PrefValue>> {
        self.scopes.get(scope)
    }
}

#[derive(Debug)]
pub struct PreferenceOverlay {
    registry: Arc<PreferenceRegistry>,
    owner_type: String,
    owner_id: Option<String>,
    /// Loaded and pending values, cast
    values: BTreeMap<Scope, BTreeMap<String, PrefValue>>,
    /// Baseline of every entry changed since the last flush
    changed: BTreeMap<Scope, BTreeMap<String, PrefValue>>,
    /// Scopes whose records were bulk loaded
    loaded: BTreeSet<Scope>,
    /// Collected errors of values currently held, keyed like the cache
    validation_errors: BTreeMap<(Scope, String), PrefError>,
}

impl PreferenceOverlay {
    /// Overlay for a new, unsaved entity
    ///
    /// # Errors
    ///
    /// Returns `UnknownOwnerType` if the type has not been declared.
    pub fn new(registry: Arc<PreferenceRegistry>, owner_type: &str) -> Result<Self> {
        if !registry.contains_type(owner_type) {
            return Err(PrefError::UnknownOwnerType {
                owner_type: owner_type.to_string(),
            });
        }
        Ok(Self {
            registry,
            owner_type: owner_type.to_string(),
            owner_id: None,
            values: BTreeMap::new(),
            changed: BTreeMap::new(),
            loaded: BTreeSet::new(),
            validation_errors: BTreeMap::new(),
        })
    }

    /// Overlay for an entity that already exists in storage
    ///
    /// # Errors
    ///
    /// Returns `UnknownOwnerType` if the type has not been declared.
    pub fn persisted(
        registry: Arc<PreferenceRegistry>,
        owner_type: &str,
        owner_id: impl Into<String>,
    ) -> Result<Self> {
        let mut overlay = Self::new(registry, owner_type)?;
        overlay.owner_id = Some(owner_id.into());
        Ok(overlay)
    }

    /// Record the id the host assigned when saving the entity
    pub fn mark_persisted(&mut self, owner_id: impl Into<String>) {
        self.owner_id = Some(owner_id.into());
    }

    pub fn owner_type(&self) -> &str {
        &self.owner_type
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    pub fn is_persisted(&self) -> bool {
        self.owner_id.is_some()
    }

    pub fn registry(&self) -> &Arc<PreferenceRegistry> {
        &self.registry
    }

    fn owner(&self) -> Option<OwnerRef> {
        self.owner_id
            .as_ref()
            .map(|id| OwnerRef::new(self.owner_type.as_str(), id.as_str()))
    }

    fn definition(&self, name: &str) -> Result<PreferenceDefinition> {
        self.registry.lookup(&self.owner_type, name).cloned()
    }

    /// Accessor for a declared preference of this overlay's owning type
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreference` for an undeclared name.
    pub fn accessor(&self, name: &str) -> Result<PreferenceAccessor> {
        self.registry.accessor(&self.owner_type, name).cloned()
    }

    fn cached(&self, name: &str, scope: &Scope) -> Option<&PrefValue> {
        self.values.get(scope).and_then(|values| values.get(name))
    }

    fn cache(&mut self, name: &str, scope: &Scope, value: PrefValue) {
        self.values
            .entry(scope.clone())
            .or_default()
            .insert(name.to_string(), value);
    }

    fn baseline(&self, name: &str, scope: &Scope) -> Option<&PrefValue> {
        self.changed.get(scope).and_then(|names| names.get(name))
    }

    /// Resolve a preference value
    ///
    /// Pending or loaded values win; otherwise a persisted owner does a
    /// point lookup, and the scope's default is the fallback. The result is
    /// cached either way.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreference` for an undeclared name; store failures
    /// are returned unchanged.
    pub fn get<S: PreferenceStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
        scope: &Scope,
    ) -> Result<PrefValue> {
        let definition = self.definition(name)?;
        if let Some(value) = self.cached(name, scope) {
            return Ok(value.clone());
        }

        let record = match self.owner() {
            Some(owner) => store.find(&RecordKey::new(owner, name, scope.clone()))?,
            None => None,
        };
        let value = match record {
            Some(record) => definition.type_cast(&record.value),
            None => definition.default_for(scope).clone(),
        };
        tracing::debug!(
            owner_type = %self.owner_type,
            preference = name,
            scope = %scope,
            "resolved preference"
        );

        self.cache(name, scope, value.clone());
        Ok(value)
    }

    /// Truthiness of the resolved value
    ///
    /// # Errors
    ///
    /// Same as [`PreferenceOverlay::get`].
    pub fn query<S: PreferenceStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
        scope: &Scope,
    ) -> Result<bool> {
        let definition = self.definition(name)?;
        let value = self.get(store, name, scope)?;
        Ok(definition.query(&value))
    }

    /// Stage a write; returns the cast value now visible to reads
    ///
    /// The first change of a `(scope, name)` since the last flush records
    /// the current value as its baseline. Writing the baseline back removes
    /// the entry from the dirty set, so an edit undone before save flushes
    /// nothing for that preference. An allowed value clears any error
    /// collected for the same `(scope, name)`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreference` for an undeclared name, and whatever the
    /// owning type's invalid value policy yields for a disallowed value.
    pub fn set<S: PreferenceStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
        value: impl Into<PrefValue>,
        scope: &Scope,
    ) -> Result<PrefValue> {
        let definition = self.definition(name)?;
        let raw = value.into();
        let cast = definition.type_cast(&raw);

        if definition.allows(&cast) {
            self.clear_validation_error(name, scope);
        } else {
            self.reject(&definition, scope, cast.clone())?;
        }

        match self.baseline(name, scope).cloned() {
            Some(old) => {
                if !value_changed(&definition, &old, &raw) {
                    self.clear_dirty(name, scope);
                }
            }
            None => {
                let old = self.get(store, name, scope)?;
                if value_changed(&definition, &old, &raw) {
                    self.changed
                        .entry(scope.clone())
                        .or_default()
                        .insert(name.to_string(), old);
                }
            }
        }

        self.cache(name, scope, cast.clone());
        Ok(cast)
    }

    fn reject(
        &mut self,
        definition: &PreferenceDefinition,
        scope: &Scope,
        value: PrefValue,
    ) -> Result<()> {
        let invalid = InvalidValue {
            owner_type: self.owner_type.clone(),
            name: definition.name().to_string(),
            scope: scope.clone(),
            value,
            allowed: definition.allowed_values().unwrap_or_default().to_vec(),
        };
        tracing::debug!(
            owner_type = %invalid.owner_type,
            preference = %invalid.name,
            value = %invalid.value,
            "value outside allowed set"
        );

        match self.registry.invalid_value_policy(&self.owner_type)? {
            InvalidValuePolicy::Raise => Err(invalid.to_error()),
            InvalidValuePolicy::Collect => {
                let error = invalid.to_error();
                self.validation_errors
                    .insert((invalid.scope, invalid.name), error);
                Ok(())
            }
            InvalidValuePolicy::Handler(handler) => handler(&invalid),
        }
    }

    fn clear_validation_error(&mut self, name: &str, scope: &Scope) {
        self.validation_errors
            .remove(&(scope.clone(), name.to_string()));
    }

    fn clear_dirty(&mut self, name: &str, scope: &Scope) -> Option<PrefValue> {
        let names = self.changed.get_mut(scope)?;
        let old = names.remove(name);
        if names.is_empty() {
            self.changed.remove(scope);
        }
        old
    }

    /// Every declared preference resolved for `scope`
    ///
    /// The first call per scope loads all of the scope's records in one
    /// query. A root snapshot also nests each other scope already touched.
    ///
    /// # Errors
    ///
    /// Store failures are returned unchanged.
    pub fn all_preferences<S: PreferenceStore + ?Sized>(
        &mut self,
        store: &S,
        scope: &Scope,
    ) -> Result<AllPreferences> {
        let values = self.load_scope(store, scope)?;
        let mut scopes = BTreeMap::new();
        if scope.is_root() {
            let others: Vec<Scope> = self
                .values
                .keys()
                .filter(|s| !s.is_root())
                .cloned()
                .collect();
            for other in others {
                let loaded = self.load_scope(store, &other)?;
                scopes.insert(other, loaded);
            }
        }
        Ok(AllPreferences { values, scopes })
    }

    fn load_scope<S: PreferenceStore + ?Sized>(
        &mut self,
        store: &S,
        scope: &Scope,
    ) -> Result<BTreeMap<String, PrefValue>> {
        let definitions = self.registry.definitions(&self.owner_type)?;

        if !self.loaded.contains(scope) {
            let records = match self.owner() {
                Some(owner) => store.find_all(&owner, scope)?,
                None => Vec::new(),
            };
            tracing::debug!(
                owner_type = %self.owner_type,
                scope = %scope,
                records = records.len(),
                "loaded preference scope"
            );

            let cache = self.values.entry(scope.clone()).or_default();
            for record in records {
                // Records for names no longer declared are ignored
                let Some(definition) = definitions.iter().find(|d| d.name() == record.name())
                else {
                    continue;
                };
                cache
                    .entry(record.key.name.clone())
                    .or_insert_with(|| definition.type_cast(&record.value));
            }
            for definition in &definitions {
                cache
                    .entry(definition.name().to_string())
                    .or_insert_with(|| definition.default_for(scope).clone());
            }
            self.loaded.insert(scope.clone());
        }

        let cache = self.values.get(scope);
        Ok(definitions
            .iter()
            .filter_map(|d| {
                cache
                    .and_then(|values| values.get(d.name()))
                    .map(|value| (d.name().to_string(), value.clone()))
            })
            .collect())
    }

    pub fn is_loaded(&self, scope: &Scope) -> bool {
        self.loaded.contains(scope)
    }

    /// Whether `name` changed in `scope` since the last flush
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreference` for an undeclared name.
    pub fn changed(&self, name: &str, scope: &Scope) -> Result<bool> {
        self.definition(name)?;
        Ok(self.baseline(name, scope).is_some())
    }

    /// Value before the pending change, or the current value if unchanged
    ///
    /// # Errors
    ///
    /// Same as [`PreferenceOverlay::get`].
    pub fn was<S: PreferenceStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
        scope: &Scope,
    ) -> Result<PrefValue> {
        self.definition(name)?;
        match self.baseline(name, scope) {
            Some(old) => Ok(old.clone()),
            None => self.get(store, name, scope),
        }
    }

    /// `(old, new)` for a changed preference
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreference` for an undeclared name.
    pub fn change(&self, name: &str, scope: &Scope) -> Result<Option<(PrefValue, PrefValue)>> {
        self.definition(name)?;
        Ok(self.baseline(name, scope).map(|old| {
            let new = self.cached(name, scope).cloned().unwrap_or_default();
            (old.clone(), new)
        }))
    }

    /// Names changed in `scope`, sorted
    pub fn changed_names(&self, scope: &Scope) -> Vec<String> {
        self.changed
            .get(scope)
            .map(|names| names.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// `name -> (old, new)` for every change in `scope`
    pub fn changes(&self, scope: &Scope) -> BTreeMap<String, (PrefValue, PrefValue)> {
        self.changed
            .get(scope)
            .map(|names| {
                names
                    .iter()
                    .map(|(name, old)| {
                        let new = self.cached(name, scope).cloned().unwrap_or_default();
                        (name.clone(), (old.clone(), new))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_dirty(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Discard the pending change of one preference and any error
    /// collected for it
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreference` for an undeclared name.
    pub fn revert(&mut self, name: &str, scope: &Scope) -> Result<()> {
        self.definition(name)?;
        if let Some(old) = self.clear_dirty(name, scope) {
            self.cache(name, scope, old);
        }
        self.clear_validation_error(name, scope);
        Ok(())
    }

    /// Errors collected under the `Collect` policy for values still held,
    /// ordered by scope then name
    pub fn validation_errors(&self) -> Vec<&PrefError> {
        self.validation_errors.values().collect()
    }

    /// # Errors
    ///
    /// Returns the first collected validation error, if any.
    pub fn validate(&self) -> Result<()> {
        match self.validation_errors.values().next() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Write every dirty entry back to the store
    ///
    /// All writes go through one `upsert_all` call. On failure the store's
    /// error is returned unchanged and the dirty set is kept; on success
    /// only the dirty set is cleared. Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns `OwnerNotPersisted` before the entity has an id; store
    /// failures are returned unchanged.
    pub fn flush<S: PreferenceStore + ?Sized>(&mut self, store: &mut S) -> Result<usize> {
        let owner = self.owner().ok_or_else(|| PrefError::OwnerNotPersisted {
            owner_type: self.owner_type.clone(),
        })?;

        let mut writes: Vec<(RecordKey, PrefValue)> = Vec::new();
        for (scope, names) in &self.changed {
            for name in names.keys() {
                let value = self.cached(name, scope).cloned().unwrap_or_default();
                writes.push((RecordKey::new(owner.clone(), name.as_str(), scope.clone()), value));
            }
        }

        if writes.is_empty() {
            return Ok(0);
        }

        let written = store.upsert_all(&writes)?;
        tracing::debug!(
            owner_type = %owner.owner_type,
            owner_id = %owner.owner_id,
            written,
            "flushed preferences"
        );
        self.changed.clear();
        Ok(written)
    }

    /// Drop every cached, pending and loaded value
    pub fn reset(&mut self) {
        self.values.clear();
        self.changed.clear();
        self.loaded.clear();
        self.validation_errors.clear();
    }
}

/// Whether writing `raw` over `old` is a change
///
/// For integer preferences whose baseline is null or zero, blank input
/// counts as null rather than casting to a number.
fn value_changed(definition: &PreferenceDefinition, old: &PrefValue, raw: &PrefValue) -> bool {
    let new = if definition.value_type() == ValueType::Integer
        && (old.is_null() || old == &PrefValue::Integer(0))
        && is_blank_input(raw)
    {
        PrefValue::Null
    } else {
        definition.type_cast(raw)
    };
    old != &new
}

fn is_blank_input(raw: &PrefValue) -> bool {
    match raw {
        PrefValue::Null => true,
        PrefValue::String(s) => s.trim().is_empty(),
        PrefValue::List(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> PreferenceDefinition {
        PreferenceDefinition::new("age", ValueType::Integer)
    }

    #[test]
    fn test_blank_over_null_integer_is_not_a_change() {
        assert!(!value_changed(&definition(), &PrefValue::Null, &"".into()));
        assert!(!value_changed(&definition(), &PrefValue::Null, &"  ".into()));
    }

    #[test]
    fn test_blank_over_zero_integer_is_a_change() {
        assert!(value_changed(&definition(), &PrefValue::Integer(0), &"".into()));
    }

    #[test]
    fn test_numeric_string_compares_cast() {
        assert!(!value_changed(&definition(), &PrefValue::Integer(5), &"5".into()));
        assert!(value_changed(&definition(), &PrefValue::Integer(5), &"6".into()));
    }

    #[test]
    fn test_quirk_limited_to_integer() {
        let def = PreferenceDefinition::new("nickname", ValueType::String);
        assert!(value_changed(&def, &PrefValue::Null, &"".into()));
    }
}
