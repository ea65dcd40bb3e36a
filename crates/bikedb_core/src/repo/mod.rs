//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for frames and components.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate records before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateKey`,
//!   `ReferentialIntegrity`) in addition to DB transport errors.

pub mod catalog_repo;
mod columns;
