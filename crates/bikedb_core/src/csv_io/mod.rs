//! Pipe-delimited CSV templates and bulk import.
//!
//! # Responsibility
//! - Export one header-only template per table.
//! - Prepare the input folder users fill in.
//! - Import filled-in files into the catalog with per-row isolation.

pub mod import;
pub mod templates;

use crate::model::value::AttributeError;
use crate::repo::catalog_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Cell delimiter shared by templates and input files.
pub const CSV_DELIMITER: u8 = b'|';

#[derive(Debug)]
pub enum TemplateError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "template I/O failed: {err}"),
            Self::Csv(err) => write!(f, "template write failed: {err}"),
        }
    }
}

impl Error for TemplateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for TemplateError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for TemplateError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Failure that aborts a whole import file.
#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    /// Header columns differ from the table's declared columns.
    SchemaMismatch {
        table: &'static str,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "import I/O failed: {err}"),
            Self::Csv(err) => write!(f, "import read failed: {err}"),
            Self::SchemaMismatch {
                table,
                missing,
                unexpected,
            } => write!(
                f,
                "header does not match table `{table}`: missing [{}], unexpected [{}]",
                missing.join(", "),
                unexpected.join(", ")
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::SchemaMismatch { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Failure confined to one input row.
#[derive(Debug)]
pub enum RowError {
    Csv(csv::Error),
    Attribute(AttributeError),
    Repo(RepoError),
}

impl Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "unreadable row: {err}"),
            Self::Attribute(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Attribute(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<csv::Error> for RowError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<AttributeError> for RowError {
    fn from(value: AttributeError) -> Self {
        Self::Attribute(value)
    }
}

impl From<RepoError> for RowError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
