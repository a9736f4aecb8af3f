//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_OWNER_TYPE: &str = "owner_type";
pub const FIELD_OWNER_ID: &str = "owner_id";
pub const FIELD_PREFERENCE: &str = "preference";
pub const FIELD_SCOPE: &str = "scope";

// Collection sizes
pub const FIELD_WRITTEN: &str = "written";
pub const FIELD_MIGRATIONS: &str = "migrations";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
