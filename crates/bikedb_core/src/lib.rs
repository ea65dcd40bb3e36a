//! Core domain logic for the bicycle component catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod csv_io;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CatalogConfig;
pub use csv_io::import::{
    import_file, import_input_dir, import_reader, FileImport, ImportReport, RowFailure,
};
pub use csv_io::templates::{export_templates, setup_input, InputSetup};
pub use csv_io::{ImportError, RowError, TemplateError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use identity::{derive_identity, IdentityError, IdentityFields, RecordId};
pub use logging::{default_log_level, init_logging, install_panic_hook, LoggingHandle};
pub use model::entity::{ComponentKind, EntityKind};
pub use model::value::{AttributeError, Attributes, FieldValue};
pub use model::record::{Component, ComponentKey, Frame};
pub use repo::catalog_repo::{CatalogRepository, RepoError, RepoResult, SqliteCatalogRepository};
pub use service::catalog_service::{CatalogService, FrameAssembly};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
