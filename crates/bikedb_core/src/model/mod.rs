//! Catalog domain model: field registry, attribute values and records.
//!
//! # Responsibility
//! - Declare every catalog table and its typed columns explicitly.
//! - Define the frame and component records persisted by the repository.
//!
//! # Invariants
//! - The registry in `entity` is the only source of column names and order.
//! - Components reference their frame by `ComponentKey::frame_serial`.

pub mod entity;
pub mod field;
pub mod record;
pub mod value;
