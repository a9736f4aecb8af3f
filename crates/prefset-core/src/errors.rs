use crate::model::PrefValue;
use thiserror::Error;

/// Result type alias using PrefError
pub type Result<T> = std::result::Result<T, PrefError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and log assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Declaration
    UnknownPreference,
    UnknownOwnerType,
    InvalidDefinition,

    // Values
    InvalidValue,
    InvalidScope,

    // Lifecycle
    NotPersisted,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    ConstraintViolation,
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::UnknownPreference => "ERR_UNKNOWN_PREFERENCE",
            ExErrorKind::UnknownOwnerType => "ERR_UNKNOWN_OWNER_TYPE",
            ExErrorKind::InvalidDefinition => "ERR_INVALID_DEFINITION",
            ExErrorKind::InvalidValue => "ERR_INVALID_VALUE",
            ExErrorKind::InvalidScope => "ERR_INVALID_SCOPE",
            ExErrorKind::NotPersisted => "ERR_NOT_PERSISTED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus optional
/// context (operation, owner, preference, scope) for debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    owner_type: Option<String>,
    owner_id: Option<String>,
    preference: Option<String>,
    scope: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            owner_type: None,
            owner_id: None,
            preference: None,
            scope: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add owning type context
    pub fn with_owner_type(mut self, owner_type: impl Into<String>) -> Self {
        self.owner_type = Some(owner_type.into());
        self
    }

    /// Add owner ID context
    pub fn with_owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Add preference name context
    pub fn with_preference(mut self, name: impl Into<String>) -> Self {
        self.preference = Some(name.into());
        self
    }

    /// Add scope context
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn owner_type(&self) -> Option<&str> {
        self.owner_type.as_deref()
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    pub fn preference(&self) -> Option<&str> {
        self.preference.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(owner_type) = &self.owner_type {
            write!(f, " (owner_type: {})", owner_type)?;
        }
        if let Some(owner_id) = &self.owner_id {
            write!(f, " (owner_id: {})", owner_id)?;
        }
        if let Some(preference) = &self.preference {
            write!(f, " (preference: {})", preference)?;
        }
        if let Some(scope) = &self.scope {
            write!(f, " (scope: {})", scope)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for preference operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrefError {
    /// No definition for this name on the owning type or any ancestor
    #[error("Unknown preference '{name}' for {owner_type}")]
    UnknownPreference { owner_type: String, name: String },

    /// Owning type was never declared in the registry
    #[error("Unknown owner type: {owner_type}")]
    UnknownOwnerType { owner_type: String },

    /// Value is not among the definition's allowed values
    #[error("Invalid value {value} for preference '{name}': allowed values are {allowed:?}")]
    InvalidPreferenceValue {
        name: String,
        value: PrefValue,
        allowed: Vec<PrefValue>,
    },

    /// Definition rejected at declaration time
    #[error("Invalid definition for preference '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// Scope parts do not form a valid scope
    #[error("Invalid scope: {reason}")]
    InvalidScope { reason: String },

    /// Flush attempted before the owning entity received an id
    #[error("Owner of type {owner_type} has not been persisted")]
    OwnerNotPersisted { owner_type: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Failure reported by the persistence layer, passed through as-is
    #[error("{0}")]
    Persistence(ExError),
}

impl PrefError {
    /// Build an UnknownPreference error
    pub fn unknown_preference(owner_type: &str, name: &str) -> Self {
        PrefError::UnknownPreference {
            owner_type: owner_type.to_string(),
            name: name.to_string(),
        }
    }
}

impl From<ExError> for PrefError {
    fn from(err: ExError) -> Self {
        PrefError::Persistence(err)
    }
}

impl From<serde_json::Error> for PrefError {
    fn from(err: serde_json::Error) -> Self {
        PrefError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from PrefError to ExError
///
/// Used by the logging macros to classify failures with a stable code.
impl From<PrefError> for ExError {
    fn from(err: PrefError) -> Self {
        match err {
            PrefError::UnknownPreference { owner_type, name } => {
                ExError::new(ExErrorKind::UnknownPreference)
                    .with_owner_type(owner_type)
                    .with_preference(name)
                    .with_message("Preference is not declared")
            }

            PrefError::UnknownOwnerType { owner_type } => {
                ExError::new(ExErrorKind::UnknownOwnerType)
                    .with_owner_type(owner_type)
                    .with_message("Owner type is not declared")
            }

            PrefError::InvalidPreferenceValue { name, value, .. } => {
                ExError::new(ExErrorKind::InvalidValue)
                    .with_preference(name)
                    .with_message(format!("Value {} is not allowed", value))
            }

            PrefError::InvalidDefinition { name, reason } => {
                ExError::new(ExErrorKind::InvalidDefinition)
                    .with_preference(name)
                    .with_message(reason)
            }

            PrefError::InvalidScope { reason } => {
                ExError::new(ExErrorKind::InvalidScope).with_message(reason)
            }

            PrefError::OwnerNotPersisted { owner_type } => ExError::new(ExErrorKind::NotPersisted)
                .with_owner_type(owner_type)
                .with_op("flush")
                .with_message("Owner has no id yet"),

            PrefError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            PrefError::Persistence(ex) => ex,
        }
    }
}
