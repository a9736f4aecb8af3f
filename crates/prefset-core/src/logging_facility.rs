//! Structured logging facility for prefset
//!
//! This module provides a canonical logging facility with:
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use prefset_core::logging_facility::{init, Profile};
//!
//! // Initialize once at application startup
//! init(Profile::Development);
//! ```
//!
//! Lifecycle boundaries (hooks, store open, migrations) own the start/end
//! events; overlay and repository internals log with `tracing::debug!` only.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{active_profile, init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
