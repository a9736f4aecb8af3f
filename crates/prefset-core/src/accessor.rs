//! Typed accessors
//!
//! One `PreferenceAccessor` is built per declared preference when it is
//! registered. Host glue looks accessors up by name instead of generating
//! methods; each accessor routes to the owning entity's overlay.

use std::sync::Arc;

use crate::errors::Result;
use crate::model::{PrefValue, PreferenceDefinition, Scope};
use crate::ops::overlay::PreferenceOverlay;
use crate::ops::store::PreferenceStore;

#[derive(Debug, Clone)]
pub struct PreferenceAccessor {
    owner_type: String,
    definition: Arc<PreferenceDefinition>,
}

impl PreferenceAccessor {
    pub(crate) fn new(owner_type: &str, definition: Arc<PreferenceDefinition>) -> Self {
        Self {
            owner_type: owner_type.to_string(),
            definition,
        }
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Owning type the definition was declared on (may be an ancestor)
    pub fn declared_on(&self) -> &str {
        &self.owner_type
    }

    pub fn definition(&self) -> &PreferenceDefinition {
        &self.definition
    }

    pub(crate) fn shared_definition(&self) -> Arc<PreferenceDefinition> {
        Arc::clone(&self.definition)
    }

    pub fn reader_name(&self) -> String {
        format!("preferred_{}", self.name())
    }

    pub fn query_name(&self) -> String {
        format!("prefers_{}?", self.name())
    }

    pub fn writer_name(&self) -> String {
        format!("preferred_{}=", self.name())
    }

    pub fn get<S: PreferenceStore + ?Sized>(
        &self,
        overlay: &mut PreferenceOverlay,
        store: &S,
        scope: &Scope,
    ) -> Result<PrefValue> {
        overlay.get(store, self.name(), scope)
    }

    pub fn query<S: PreferenceStore + ?Sized>(
        &self,
        overlay: &mut PreferenceOverlay,
        store: &S,
        scope: &Scope,
    ) -> Result<bool> {
        overlay.query(store, self.name(), scope)
    }

    pub fn set<S: PreferenceStore + ?Sized>(
        &self,
        overlay: &mut PreferenceOverlay,
        store: &S,
        value: impl Into<PrefValue>,
        scope: &Scope,
    ) -> Result<PrefValue> {
        overlay.set(store, self.name(), value, scope)
    }

    pub fn changed(&self, overlay: &PreferenceOverlay, scope: &Scope) -> Result<bool> {
        overlay.changed(self.name(), scope)
    }

    pub fn was<S: PreferenceStore + ?Sized>(
        &self,
        overlay: &mut PreferenceOverlay,
        store: &S,
        scope: &Scope,
    ) -> Result<PrefValue> {
        overlay.was(store, self.name(), scope)
    }

    pub fn change(
        &self,
        overlay: &PreferenceOverlay,
        scope: &Scope,
    ) -> Result<Option<(PrefValue, PrefValue)>> {
        overlay.change(self.name(), scope)
    }

    pub fn revert(&self, overlay: &mut PreferenceOverlay, scope: &Scope) -> Result<()> {
        overlay.revert(self.name(), scope)
    }
}
