use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::scope::Scope;
use super::value::{PrefValue, ValueType};
use crate::errors::{PrefError, Result};

/// Static metadata for one declared preference
///
/// Defaults, group defaults and allowed values are stored already cast to
/// `value_type`, so comparisons against cast input are exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceDefinition {
    name: String,
    value_type: ValueType,
    default: PrefValue,
    allowed_values: Option<Vec<PrefValue>>,
    /// Alternate defaults keyed by scope label or entity type name
    group_defaults: BTreeMap<String, PrefValue>,
}

impl PreferenceDefinition {
    /// Create a definition with a `Null` default
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            default: PrefValue::Null,
            allowed_values: None,
            group_defaults: BTreeMap::new(),
        }
    }

    /// Shorthand for a boolean preference with the given default
    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, ValueType::Boolean).with_default(default)
    }

    pub fn with_default(mut self, default: impl Into<PrefValue>) -> Self {
        self.default = self.value_type.cast(&default.into());
        self
    }

    pub fn with_allowed_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PrefValue>,
    {
        let cast = values
            .into_iter()
            .map(|v| self.value_type.cast(&v.into()))
            .collect();
        self.allowed_values = Some(cast);
        self
    }

    /// Use a different default when resolving inside scopes of `group`
    ///
    /// `group` matches a label scope by its label and an entity scope by its
    /// entity type.
    pub fn with_group_default(
        mut self,
        group: impl Into<String>,
        default: impl Into<PrefValue>,
    ) -> Self {
        let cast = self.value_type.cast(&default.into());
        self.group_defaults.insert(group.into(), cast);
        self
    }

    /// Check the definition is internally consistent
    ///
    /// # Errors
    ///
    /// Returns `InvalidDefinition` for an empty name and
    /// `InvalidPreferenceValue` when a default is outside the allowed set.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PrefError::InvalidDefinition {
                name: self.name.clone(),
                reason: "name cannot be empty".to_string(),
            });
        }
        if let Some(allowed) = self.allowed_values.as_deref() {
            if allowed.is_empty() {
                return Err(PrefError::InvalidDefinition {
                    name: self.name.clone(),
                    reason: "allowed values cannot be empty".to_string(),
                });
            }
            let defaults = std::iter::once(&self.default).chain(self.group_defaults.values());
            for default in defaults {
                if !default.is_null() && !self.allows(default) {
                    return Err(self.invalid_value(default.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn default_value(&self) -> &PrefValue {
        &self.default
    }

    pub fn allowed_values(&self) -> Option<&[PrefValue]> {
        self.allowed_values.as_deref()
    }

    pub fn group_defaults(&self) -> &BTreeMap<String, PrefValue> {
        &self.group_defaults
    }

    pub fn is_number(&self) -> bool {
        self.value_type.is_number()
    }

    /// Default that applies when resolving inside `scope`
    pub fn default_for(&self, scope: &Scope) -> &PrefValue {
        scope
            .group_type()
            .and_then(|group| self.group_defaults.get(group))
            .unwrap_or(&self.default)
    }

    pub fn type_cast(&self, value: &PrefValue) -> PrefValue {
        self.value_type.cast(value)
    }

    pub fn query(&self, value: &PrefValue) -> bool {
        self.value_type.truthiness(value)
    }

    /// Whether an already cast value passes the allowed-values check
    pub fn allows(&self, value: &PrefValue) -> bool {
        match &self.allowed_values {
            Some(allowed) => allowed.contains(value),
            None => true,
        }
    }

    pub(crate) fn invalid_value(&self, value: PrefValue) -> PrefError {
        PrefError::InvalidPreferenceValue {
            name: self.name.clone(),
            value,
            allowed: self.allowed_values.clone().unwrap_or_default(),
        }
    }
}
