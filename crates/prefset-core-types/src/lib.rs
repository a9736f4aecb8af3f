//! Core types shared across prefset facilities
//!
//! This crate carries the canonical field keys and event names used by the
//! structured logging and error facilities, so that every crate in the
//! workspace emits the same vocabulary.

pub mod schema;
