use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{PrefError, Result};

/// A persisted host entity that can own preferences or act as a scope
pub trait EntityRef {
    /// Type name used to key records (e.g. "User")
    fn entity_type(&self) -> &str;

    /// Stable identifier of the persisted entity
    fn entity_id(&self) -> String;
}

/// Secondary dimension under which a preference is overridden
///
/// Normalizes to a `(group_id, group_type)` pair: root is `(None, None)`,
/// a label is `(None, label)` and an entity is `(id, type)`. Equality,
/// hashing and ordering all follow that pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Scope {
    #[default]
    Root,
    Label(String),
    Entity { entity_type: String, id: String },
}

impl Scope {
    pub fn label(label: impl Into<String>) -> Self {
        Scope::Label(label.into())
    }

    pub fn entity(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Scope::Entity {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Scope keyed to a host entity
    pub fn of<E: EntityRef + ?Sized>(entity: &E) -> Self {
        Scope::entity(entity.entity_type(), entity.entity_id())
    }

    /// Rebuild a scope from stored `(group_id, group_type)` columns
    ///
    /// # Errors
    ///
    /// Returns `InvalidScope` when an id is present without a type.
    pub fn from_parts(group_id: Option<String>, group_type: Option<String>) -> Result<Self> {
        match (group_id, group_type) {
            (None, None) => Ok(Scope::Root),
            (None, Some(label)) => Ok(Scope::Label(label)),
            (Some(id), Some(entity_type)) => Ok(Scope::Entity { entity_type, id }),
            (Some(id), None) => Err(PrefError::InvalidScope {
                reason: format!("group id {} has no group type", id),
            }),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Scope::Root)
    }

    pub fn group_id(&self) -> Option<&str> {
        match self {
            Scope::Entity { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Label for label scopes, entity type for entity scopes
    pub fn group_type(&self) -> Option<&str> {
        match self {
            Scope::Root => None,
            Scope::Label(label) => Some(label),
            Scope::Entity { entity_type, .. } => Some(entity_type),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Root => f.write_str("root"),
            Scope::Label(label) => f.write_str(label),
            Scope::Entity { entity_type, id } => write!(f, "{}#{}", entity_type, id),
        }
    }
}

impl From<&str> for Scope {
    fn from(label: &str) -> Self {
        Scope::Label(label.to_string())
    }
}

impl From<String> for Scope {
    fn from(label: String) -> Self {
        Scope::Label(label)
    }
}
