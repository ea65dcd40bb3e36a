//! Catalog directory layout.
//!
//! # Responsibility
//! - Derive every path an invocation touches from one base directory.
//!
//! # Invariants
//! - Paths are derived, never read from global state.

use crate::logging::default_log_level;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_FILE: &str = "bikedb.sqlite3";
pub const TEMPLATES_DIR_NAME: &str = "templates";
pub const INPUT_DIR_NAME: &str = "input";
pub const LOG_DIR_NAME: &str = "logs";

/// Resolved locations and settings for one catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub base_dir: PathBuf,
    pub database_path: PathBuf,
    pub templates_dir: PathBuf,
    pub input_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl CatalogConfig {
    /// Lays out the default catalog structure under `base_dir`.
    pub fn from_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            database_path: base_dir.join(DEFAULT_DATABASE_FILE),
            templates_dir: base_dir.join(TEMPLATES_DIR_NAME),
            input_dir: base_dir.join(INPUT_DIR_NAME),
            log_dir: base_dir.join(LOG_DIR_NAME),
            log_level: default_log_level().to_string(),
            base_dir,
        }
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// Default base directory: the parent of `cwd`, or `cwd` itself at the root.
pub fn default_base_dir(cwd: &Path) -> PathBuf {
    cwd.parent().unwrap_or(cwd).to_path_buf()
}
