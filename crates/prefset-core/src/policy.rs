//! Invalid value policy
//!
//! When a preference declares allowed values, a write whose cast value is
//! outside that set is handed to the owning type's `InvalidValuePolicy`.
//! Exactly one policy is active per owning type; subtypes inherit it.

use std::fmt;
use std::sync::Arc;

use crate::errors::{PrefError, Result};
use crate::model::{PrefValue, Scope};

/// Details of a rejected write, passed to custom handlers
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidValue {
    pub owner_type: String,
    pub name: String,
    pub scope: Scope,
    pub value: PrefValue,
    pub allowed: Vec<PrefValue>,
}

impl InvalidValue {
    pub fn to_error(&self) -> PrefError {
        PrefError::InvalidPreferenceValue {
            name: self.name.clone(),
            value: self.value.clone(),
            allowed: self.allowed.clone(),
        }
    }
}

/// Callback invoked for invalid writes; `Ok` lets the write proceed
pub type InvalidValueHandler = Arc<dyn Fn(&InvalidValue) -> Result<()> + Send + Sync>;

/// How an owning type reacts to values outside a preference's allowed set
#[derive(Clone, Default)]
pub enum InvalidValuePolicy {
    /// Fail the write with `InvalidPreferenceValue`; nothing is written
    #[default]
    Raise,
    /// Write the value and append the error to the overlay's validation errors
    Collect,
    /// Delegate to a custom callback
    Handler(InvalidValueHandler),
}

impl InvalidValuePolicy {
    /// Build a handler policy from a closure
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&InvalidValue) -> Result<()> + Send + Sync + 'static,
    {
        InvalidValuePolicy::Handler(Arc::new(f))
    }
}

impl fmt::Debug for InvalidValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidValuePolicy::Raise => f.write_str("Raise"),
            InvalidValuePolicy::Collect => f.write_str("Collect"),
            InvalidValuePolicy::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}
