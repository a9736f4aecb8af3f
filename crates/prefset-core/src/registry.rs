//! Preference definition registry
//!
//! Definitions are declared once per owning type at setup time. Owning types
//! form an explicit single-parent hierarchy; lookups walk from the requested
//! type towards the root and the nearest definition wins. After setup the
//! registry is shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::accessor::PreferenceAccessor;
use crate::errors::{PrefError, Result};
use crate::model::PreferenceDefinition;
use crate::policy::InvalidValuePolicy;

#[derive(Debug, Default)]
struct OwnerTypeEntry {
    parent: Option<String>,
    /// Accessors in declaration order; each wraps its definition
    accessors: Vec<PreferenceAccessor>,
    index: HashMap<String, usize>,
    policy: Option<InvalidValuePolicy>,
}

/// Registry of preference definitions keyed by owning type
#[derive(Debug, Default)]
pub struct PreferenceRegistry {
    types: HashMap<String, OwnerTypeEntry>,
}

impl PreferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an owning type and its parent
    ///
    /// Re-declaring a type with the same parent is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOwnerType` if `parent` has not been declared, and
    /// `InvalidDefinition` if the type already exists with another parent.
    pub fn register_type(&mut self, owner_type: &str, parent: Option<&str>) -> Result<()> {
        if let Some(parent) = parent {
            if !self.types.contains_key(parent) {
                return Err(PrefError::UnknownOwnerType {
                    owner_type: parent.to_string(),
                });
            }
        }

        match self.types.get(owner_type) {
            Some(entry) if entry.parent.as_deref() == parent => Ok(()),
            Some(entry) => Err(PrefError::InvalidDefinition {
                name: owner_type.to_string(),
                reason: format!(
                    "owner type already declared with parent {:?}",
                    entry.parent
                ),
            }),
            None => {
                self.types.insert(
                    owner_type.to_string(),
                    OwnerTypeEntry {
                        parent: parent.map(str::to_string),
                        ..OwnerTypeEntry::default()
                    },
                );
                Ok(())
            }
        }
    }

    /// Declare a preference on an owning type
    ///
    /// Last write wins for a repeated name. An undeclared owning type is
    /// declared as a root type.
    ///
    /// # Errors
    ///
    /// Returns the definition's validation error, if any.
    pub fn register(&mut self, owner_type: &str, definition: PreferenceDefinition) -> Result<()> {
        definition.validate()?;
        tracing::debug!(
            owner_type,
            preference = definition.name(),
            value_type = %definition.value_type(),
            "register preference"
        );

        let entry = self.types.entry(owner_type.to_string()).or_default();
        let accessor = PreferenceAccessor::new(owner_type, Arc::new(definition));
        match entry.index.get(accessor.name()) {
            Some(&pos) => entry.accessors[pos] = accessor,
            None => {
                entry
                    .index
                    .insert(accessor.name().to_string(), entry.accessors.len());
                entry.accessors.push(accessor);
            }
        }
        Ok(())
    }

    /// Set the invalid value policy for an owning type and its subtypes
    ///
    /// # Errors
    ///
    /// Returns `UnknownOwnerType` if the type has not been declared.
    pub fn set_invalid_value_policy(
        &mut self,
        owner_type: &str,
        policy: InvalidValuePolicy,
    ) -> Result<()> {
        let entry = self
            .types
            .get_mut(owner_type)
            .ok_or_else(|| PrefError::UnknownOwnerType {
                owner_type: owner_type.to_string(),
            })?;
        entry.policy = Some(policy);
        Ok(())
    }

    pub fn contains_type(&self, owner_type: &str) -> bool {
        self.types.contains_key(owner_type)
    }

    /// Owning type followed by its ancestors, nearest first
    fn chain(&self, owner_type: &str) -> Result<Vec<&OwnerTypeEntry>> {
        let mut chain = Vec::new();
        let mut current = Some(owner_type);
        while let Some(name) = current {
            let entry = self
                .types
                .get(name)
                .ok_or_else(|| PrefError::UnknownOwnerType {
                    owner_type: name.to_string(),
                })?;
            chain.push(entry);
            current = entry.parent.as_deref();
        }
        Ok(chain)
    }

    /// Nearest accessor for `name` on `owner_type` or an ancestor
    ///
    /// # Errors
    ///
    /// Returns `UnknownOwnerType` for an undeclared type and
    /// `UnknownPreference` when no definition matches.
    pub fn accessor(&self, owner_type: &str, name: &str) -> Result<&PreferenceAccessor> {
        self.chain(owner_type)?
            .into_iter()
            .find_map(|entry| entry.index.get(name).map(|&pos| &entry.accessors[pos]))
            .ok_or_else(|| PrefError::unknown_preference(owner_type, name))
    }

    /// Nearest definition for `name` on `owner_type` or an ancestor
    ///
    /// # Errors
    ///
    /// Same as [`PreferenceRegistry::accessor`].
    pub fn lookup(&self, owner_type: &str, name: &str) -> Result<&PreferenceDefinition> {
        self.accessor(owner_type, name).map(PreferenceAccessor::definition)
    }

    /// Effective accessor table for an owning type
    ///
    /// Ancestors' declarations come first in declaration order; a subtype's
    /// override replaces the inherited entry in place.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOwnerType` for an undeclared type.
    pub fn accessors(&self, owner_type: &str) -> Result<Vec<PreferenceAccessor>> {
        let mut merged: Vec<PreferenceAccessor> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for entry in self.chain(owner_type)?.into_iter().rev() {
            for accessor in &entry.accessors {
                match positions.get(accessor.name()) {
                    Some(&pos) => merged[pos] = accessor.clone(),
                    None => {
                        positions.insert(accessor.name().to_string(), merged.len());
                        merged.push(accessor.clone());
                    }
                }
            }
        }
        Ok(merged)
    }

    /// Effective definitions for an owning type, in accessor order
    ///
    /// # Errors
    ///
    /// Returns `UnknownOwnerType` for an undeclared type.
    pub fn definitions(&self, owner_type: &str) -> Result<Vec<Arc<PreferenceDefinition>>> {
        Ok(self
            .accessors(owner_type)?
            .into_iter()
            .map(|accessor| accessor.shared_definition())
            .collect())
    }

    /// Active invalid value policy, inherited from the nearest ancestor
    ///
    /// # Errors
    ///
    /// Returns `UnknownOwnerType` for an undeclared type.
    pub fn invalid_value_policy(&self, owner_type: &str) -> Result<InvalidValuePolicy> {
        Ok(self
            .chain(owner_type)?
            .into_iter()
            .find_map(|entry| entry.policy.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PrefValue, ValueType};

    #[test]
    fn test_register_declares_root_type() {
        let mut registry = PreferenceRegistry::new();
        registry
            .register("User", PreferenceDefinition::boolean("hot_salsa", true))
            .unwrap();
        assert!(registry.contains_type("User"));
        assert_eq!(
            registry.lookup("User", "hot_salsa").unwrap().default_value(),
            &PrefValue::Boolean(true)
        );
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut registry = PreferenceRegistry::new();
        let err = registry.register_type("Admin", Some("User")).unwrap_err();
        assert!(matches!(err, PrefError::UnknownOwnerType { .. }));
    }

    #[test]
    fn test_redeclare_with_other_parent_rejected() {
        let mut registry = PreferenceRegistry::new();
        registry.register_type("A", None).unwrap();
        registry.register_type("B", None).unwrap();
        registry.register_type("C", Some("A")).unwrap();
        registry.register_type("C", Some("A")).unwrap();
        assert!(registry.register_type("C", Some("B")).is_err());
    }

    #[test]
    fn test_last_registration_wins_in_place() {
        let mut registry = PreferenceRegistry::new();
        registry
            .register("User", PreferenceDefinition::new("a", ValueType::Any))
            .unwrap();
        registry
            .register("User", PreferenceDefinition::new("b", ValueType::Any))
            .unwrap();
        registry
            .register(
                "User",
                PreferenceDefinition::new("a", ValueType::Integer).with_default(1),
            )
            .unwrap();

        let defs = registry.definitions("User").unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(defs[0].value_type(), ValueType::Integer);
    }
}
