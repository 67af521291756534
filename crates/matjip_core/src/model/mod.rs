//! Restaurant directory domain model.
//!
//! # Responsibility
//! - Define one record type per persisted entity.
//! - Own field-level validation and display labels.
//!
//! # Invariants
//! - `id == None` means the record was never persisted.
//! - Timestamps are epoch milliseconds assigned by storage; values set by
//!   callers are ignored on write.
//! - Cross-record rules (representative image) live in the repository layer
//!   because they need sibling rows.

pub mod article;
pub mod catalog;
pub mod media;
pub mod region;
pub mod restaurant;
pub mod review;
pub mod validation;

/// Renders a persisted id, or `None` for unsaved records.
pub(crate) fn display_id(id: Option<i64>) -> String {
    id.map_or_else(|| "None".to_string(), |id| id.to_string())
}
