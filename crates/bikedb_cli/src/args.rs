//! CLI argument definitions using clap derive

use bikedb_core::config::default_base_dir;
use bikedb_core::CatalogConfig;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bikedb")]
#[command(version, about = "Bicycle component catalog")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Catalog base directory (default: parent of the working directory)
    #[arg(long, global = true, env = "BIKEDB_HOME")]
    pub home: Option<PathBuf>,

    /// Database file (default: <home>/bikedb.sqlite3)
    #[arg(long, global = true, env = "BIKEDB_DATABASE")]
    pub database: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true, env = "BIKEDB_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl GlobalOpts {
    /// Builds the catalog layout; relative paths resolve against the working directory.
    pub fn resolve(&self) -> Result<CatalogConfig> {
        let cwd = std::env::current_dir().into_diagnostic()?;
        let base_dir = match &self.home {
            Some(home) => cwd.join(home),
            None => default_base_dir(&cwd),
        };

        let mut config = CatalogConfig::from_base_dir(base_dir);
        if let Some(database) = &self.database {
            config = config.with_database_path(cwd.join(database));
        }
        if let Some(level) = &self.log_level {
            config = config.with_log_level(level.as_str());
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create every catalog table
    Init,

    /// Write one pipe-delimited header template per table
    Templates,

    /// Copy templates into the input folder, keeping existing files
    SetupInput,

    /// Import one filled-in file into a table
    Import(ImportArgs),

    /// Import every <table>.csv in the input folder, frames first
    ImportAll,

    /// Print a frame and its attached components as JSON
    Show(ShowArgs),

    /// Derive the identity fingerprint of a part
    Fingerprint(FingerprintArgs),
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Templates => "templates",
            Self::SetupInput => "setup-input",
            Self::Import(_) => "import",
            Self::ImportAll => "import-all",
            Self::Show(_) => "show",
            Self::Fingerprint(_) => "fingerprint",
        }
    }
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Target table, e.g. `frame` or `fork`
    pub table: String,

    /// Pipe-delimited input file
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Frame serial number
    pub serial: String,
}

#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Production year
    #[arg(long)]
    pub year: i64,

    #[arg(long)]
    pub manufacturer: String,

    #[arg(long)]
    pub model: String,

    /// Purchase date as YYYY-MM-DD
    #[arg(long)]
    pub purchase_date: NaiveDate,
}
