//! Query-by-preference filter
//!
//! Selects owners whose resolved value (stored override, or default when no
//! override exists) equals, or for the inverse form does not equal, each
//! requested value. The builder resolves definitions and casts values up
//! front; stores only ever see fully prepared predicates.

use crate::errors::Result;
use crate::model::{PrefValue, Scope};
use crate::ops::store::PreferenceStore;
use crate::registry::PreferenceRegistry;

/// One prepared `(name, scope) == value` requirement
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPredicate {
    pub name: String,
    pub scope: Scope,
    /// Requested value, cast to the preference's type
    pub value: PrefValue,
    /// Whether an owner without a stored record satisfies the equality
    pub default_matches: bool,
    /// Inverse form: the owner must NOT resolve to `value`
    pub negate: bool,
}

impl FilterPredicate {
    /// Evaluate against the owner's stored value for this key, if any
    pub fn matches(&self, stored: Option<&PrefValue>) -> bool {
        let equal = match stored {
            Some(value) => value == &self.value,
            None => self.default_matches,
        };
        equal != self.negate
    }
}

/// Builder for preference filters on one owning type
#[derive(Debug)]
pub struct PreferenceFilter<'r> {
    registry: &'r PreferenceRegistry,
    owner_type: String,
    predicates: Vec<FilterPredicate>,
}

impl<'r> PreferenceFilter<'r> {
    /// # Errors
    ///
    /// Returns `UnknownOwnerType` if the type has not been declared.
    pub fn new(registry: &'r PreferenceRegistry, owner_type: &str) -> Result<Self> {
        if !registry.contains_type(owner_type) {
            return Err(crate::errors::PrefError::UnknownOwnerType {
                owner_type: owner_type.to_string(),
            });
        }
        Ok(Self {
            registry,
            owner_type: owner_type.to_string(),
            predicates: Vec::new(),
        })
    }

    /// Require `name` (root scope) to resolve to `value`
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreference` for an undeclared name.
    pub fn with(self, name: &str, value: impl Into<PrefValue>) -> Result<Self> {
        self.push(Scope::Root, name, value.into(), false)
    }

    /// Require `name` within `scope` to resolve to `value`
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreference` for an undeclared name.
    pub fn with_scoped(self, scope: Scope, name: &str, value: impl Into<PrefValue>) -> Result<Self> {
        self.push(scope, name, value.into(), false)
    }

    /// Require `name` (root scope) NOT to resolve to `value`
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreference` for an undeclared name.
    pub fn without(self, name: &str, value: impl Into<PrefValue>) -> Result<Self> {
        self.push(Scope::Root, name, value.into(), true)
    }

    /// Require `name` within `scope` NOT to resolve to `value`
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreference` for an undeclared name.
    pub fn without_scoped(
        self,
        scope: Scope,
        name: &str,
        value: impl Into<PrefValue>,
    ) -> Result<Self> {
        self.push(scope, name, value.into(), true)
    }

    fn push(mut self, scope: Scope, name: &str, value: PrefValue, negate: bool) -> Result<Self> {
        let definition = self.registry.lookup(&self.owner_type, name)?;
        let value = definition.type_cast(&value);
        let default_matches = definition.default_for(&scope) == &value;
        self.predicates.push(FilterPredicate {
            name: name.to_string(),
            scope,
            value,
            default_matches,
            negate,
        });
        Ok(self)
    }

    pub fn owner_type(&self) -> &str {
        &self.owner_type
    }

    pub fn predicates(&self) -> &[FilterPredicate] {
        &self.predicates
    }

    /// Narrow `candidates` to the owners matching every predicate
    ///
    /// # Errors
    ///
    /// Propagates the store's error unchanged.
    pub fn apply<S: PreferenceStore + ?Sized>(
        &self,
        store: &S,
        candidates: &[String],
    ) -> Result<Vec<String>> {
        tracing::debug!(
            owner_type = %self.owner_type,
            predicates = self.predicates.len(),
            candidates = candidates.len(),
            "apply preference filter"
        );
        store.filter_owners(&self.owner_type, candidates, &self.predicates)
    }
}
