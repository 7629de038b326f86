//! Domain model for projects, notes, tags and templates.
//!
//! # Responsibility
//! - Define persisted read models returned by the storage engine.
//! - Define typed write payloads (drafts, import records) so defaulting of
//!   ids, titles and timestamps happens in one place.
//!
//! # Invariants
//! - Timestamps are Unix epoch milliseconds in Rust and in SQLite.
//! - Blank optional strings are normalized to `None` before persistence.

pub mod dataset;
pub mod note;
pub mod project;
pub mod template;
pub mod timestamp;
pub mod validation;

/// Trims an optional string and maps blank values to `None`.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
