//! Header-only CSV templates and input-folder setup.
//!
//! # Invariants
//! - Template headers list every column of the table in declaration order.
//! - `setup_input` never overwrites an existing input file.

use crate::csv_io::{TemplateError, CSV_DELIMITER};
use crate::logging::loggable;
use crate::model::entity::EntityKind;
use csv::WriterBuilder;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATE_SUFFIX: &str = "_template.csv";

/// Outcome of preparing the input folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSetup {
    /// Whether templates had to be exported first.
    pub templates_exported: bool,
    /// Input files created from templates.
    pub created: Vec<PathBuf>,
    /// Input files that already existed and were left as-is.
    pub skipped: Vec<PathBuf>,
}

/// `<table>_template.csv`
pub fn template_file_name(entity: EntityKind) -> String {
    format!("{}{TEMPLATE_SUFFIX}", entity.table_name())
}

/// `<table>.csv`
pub fn input_file_name(entity: EntityKind) -> String {
    format!("{}.csv", entity.table_name())
}

/// Column names written to a template's header row.
pub fn template_header(entity: EntityKind) -> Vec<&'static str> {
    entity.columns().iter().map(|field| field.name).collect()
}

/// Writes one template per table into `dir`, creating it if needed.
///
/// Existing templates are regenerated. Returns the written paths in table
/// order, frame first.
pub fn export_templates(dir: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for entity in EntityKind::all() {
        let path = dir.join(template_file_name(entity));
        let mut writer = WriterBuilder::new()
            .delimiter(CSV_DELIMITER)
            .from_path(&path)?;
        writer.write_record(template_header(entity))?;
        writer.flush()?;
        debug!(
            "event=template_write module=csv_io status=ok table={}",
            entity.table_name()
        );
        written.push(path);
    }

    info!(
        "event=templates_export module=csv_io status=ok count={} dir={}",
        written.len(),
        loggable(&dir.display().to_string())
    );
    Ok(written)
}

/// Copies every `<table>_template.csv` into `input_dir` as `<table>.csv`.
///
/// Files whose name is not a catalog table are ignored.
/// Exports templates first when `templates_dir` does not exist yet.
pub fn setup_input(templates_dir: &Path, input_dir: &Path) -> Result<InputSetup, TemplateError> {
    let mut setup = InputSetup::default();
    if !templates_dir.is_dir() {
        export_templates(templates_dir)?;
        setup.templates_exported = true;
    }
    fs::create_dir_all(input_dir)?;

    let mut templates = fs::read_dir(templates_dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    templates.sort();

    for template in templates {
        let Some(table) = template
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(TEMPLATE_SUFFIX))
        else {
            continue;
        };
        let Some(entity) = EntityKind::from_table_name(table) else {
            debug!(
                "event=input_setup module=csv_io status=skipped reason=unknown_table file={}",
                loggable(&template.display().to_string())
            );
            continue;
        };
        let target = input_dir.join(input_file_name(entity));
        if target.exists() {
            setup.skipped.push(target);
            continue;
        }
        fs::copy(&template, &target)?;
        setup.created.push(target);
    }

    info!(
        "event=input_setup module=csv_io status=ok created={} skipped={} dir={}",
        setup.created.len(),
        setup.skipped.len(),
        loggable(&input_dir.display().to_string())
    );
    Ok(setup)
}
