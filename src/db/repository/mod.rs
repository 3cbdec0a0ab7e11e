//! Repository layer: entity-scoped database operations.
//!
//! Free functions over `&Connection`; all public items re-exported here.

mod document;
mod note;
mod patient;
mod section_record;

pub use document::*;
pub use note::*;
pub use patient::*;
pub use section_record::*;

/// Storage format for timestamps (created_at, updated_at, sign_date, ...).
pub(crate) const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage format for dates.
pub(crate) const DATE_FMT: &str = "%Y-%m-%d";
