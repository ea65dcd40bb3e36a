//! Bulk import of filled-in input files.
//!
//! # Responsibility
//! - Check the header against the table's declared columns.
//! - Coerce each row into a typed record and insert it through the service.
//!
//! # Invariants
//! - A header mismatch rejects the whole file before any row is read.
//! - A failing row never prevents other rows from being committed.
//! - All committed rows of one file land in a single transaction.

use crate::csv_io::templates::input_file_name;
use crate::csv_io::{ImportError, RowError, CSV_DELIMITER};
use crate::identity::{component_identity, frame_identity};
use crate::logging::loggable;
use crate::model::entity::EntityKind;
use crate::model::field::FieldDef;
use crate::model::record::{Component, Frame};
use crate::model::value::{Attributes, FieldValue};
use crate::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use crate::service::catalog_service::CatalogService;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// One rejected input row.
#[derive(Debug)]
pub struct RowFailure {
    /// 1-based line number in the input file; the header is line 1.
    pub line: usize,
    pub reason: RowError,
}

/// Summary of one imported file.
#[derive(Debug)]
pub struct ImportReport {
    pub entity: EntityKind,
    pub rows_read: usize,
    pub committed: usize,
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            rows_read: 0,
            committed: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of one file within a directory import.
#[derive(Debug)]
pub struct FileImport {
    pub entity: EntityKind,
    pub path: PathBuf,
    /// `Err` means nothing from this file was committed.
    pub outcome: Result<ImportReport, ImportError>,
}

impl FileImport {
    pub fn is_clean(&self) -> bool {
        self.outcome.as_ref().is_ok_and(ImportReport::is_clean)
    }
}

/// Imports one input file into `entity`'s table.
pub fn import_file(
    conn: &Connection,
    entity: EntityKind,
    path: &Path,
) -> Result<ImportReport, ImportError> {
    info!(
        "event=import_file module=csv_io status=start table={} path={}",
        entity.table_name(),
        loggable(&path.display().to_string())
    );
    let file = File::open(path)?;
    import_reader(conn, entity, BufReader::new(file))
}

/// Imports pipe-delimited rows from `reader` into `entity`'s table.
///
/// # Errors
/// - `SchemaMismatch` when the header differs from the declared columns.
/// - `Io`/`Csv` when the header cannot be read.
/// - `Repo` when the connection is not an initialized catalog or the
///   transaction cannot be committed.
///
/// Row-level problems are reported in `ImportReport::failures` instead.
pub fn import_reader<R: Read>(
    conn: &Connection,
    entity: EntityKind,
    reader: R,
) -> Result<ImportReport, ImportError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let layout = column_layout(entity, &headers)?;

    let mut report = ImportReport::new(entity);
    let tx = conn.unchecked_transaction()?;
    {
        let service = CatalogService::new(SqliteCatalogRepository::try_new(&tx)?);
        for (row_idx, result) in rdr.records().enumerate() {
            let line = row_idx + 2;
            report.rows_read += 1;

            let outcome = result
                .map_err(RowError::from)
                .and_then(|record| import_row(&service, entity, &layout, &record));
            match outcome {
                Ok(()) => report.committed += 1,
                Err(reason) => {
                    warn!(
                        "event=import_row module=csv_io status=error table={} line={} reason={}",
                        entity.table_name(),
                        line,
                        loggable(&reason.to_string())
                    );
                    report.failures.push(RowFailure { line, reason });
                }
            }
        }
    }
    tx.commit()?;

    info!(
        "event=import_file module=csv_io status=ok table={} rows={} committed={} failed={}",
        entity.table_name(),
        report.rows_read,
        report.committed,
        report.failures.len()
    );
    Ok(report)
}

/// Imports every `<table>.csv` found in `input_dir`, frames first.
///
/// Tables without an input file are skipped. A file-level error is recorded
/// for that file and the remaining files are still imported, so the result
/// always accounts for every committed file.
pub fn import_input_dir(conn: &Connection, input_dir: &Path) -> Vec<FileImport> {
    let mut imports = Vec::new();
    for entity in EntityKind::all() {
        let path = input_dir.join(input_file_name(entity));
        if !path.is_file() {
            debug!(
                "event=import_file module=csv_io status=skipped table={}",
                entity.table_name()
            );
            continue;
        }

        let outcome = import_file(conn, entity, &path);
        if let Err(err) = &outcome {
            warn!(
                "event=import_file module=csv_io status=error table={} reason={}",
                entity.table_name(),
                loggable(&err.to_string())
            );
        }
        imports.push(FileImport {
            entity,
            path,
            outcome,
        });
    }
    imports
}

/// Maps header positions to declared columns.
fn column_layout(
    entity: EntityKind,
    headers: &StringRecord,
) -> Result<Vec<(usize, FieldDef)>, ImportError> {
    let columns = entity.columns();
    let mut seen = BTreeSet::new();
    let mut layout = Vec::with_capacity(columns.len());
    let mut unexpected = Vec::new();

    for (index, name) in headers.iter().enumerate() {
        match columns.iter().find(|field| field.name == name) {
            Some(field) if seen.insert(field.name) => layout.push((index, *field)),
            _ => unexpected.push(name.to_string()),
        }
    }

    let missing = columns
        .iter()
        .filter(|field| !seen.contains(field.name))
        .map(|field| field.name.to_string())
        .collect::<Vec<_>>();

    if missing.is_empty() && unexpected.is_empty() {
        return Ok(layout);
    }
    warn!(
        "event=import_header module=csv_io status=error table={} missing={} unexpected={}",
        entity.table_name(),
        missing.len(),
        unexpected.len()
    );
    Err(ImportError::SchemaMismatch {
        table: entity.table_name(),
        missing,
        unexpected,
    })
}

fn import_row<R: CatalogRepository>(
    service: &CatalogService<R>,
    entity: EntityKind,
    layout: &[(usize, FieldDef)],
    record: &StringRecord,
) -> Result<(), RowError> {
    let attributes = coerce_row(layout, record)?;
    match entity {
        EntityKind::Frame => {
            let frame = Frame::from_attributes(attributes)?;
            log_fingerprint(entity, frame_identity(&frame).ok());
            service.add_frame(&frame)?;
        }
        EntityKind::Component(kind) => {
            let component = Component::from_attributes(kind, attributes)?;
            log_fingerprint(entity, component_identity(&component).ok());
            service.add_component(&component)?;
        }
    }
    Ok(())
}

fn coerce_row(layout: &[(usize, FieldDef)], record: &StringRecord) -> Result<Attributes, RowError> {
    let mut attributes = Attributes::new();
    for (index, field) in layout {
        let cell = record.get(*index).unwrap_or_default();
        if let Some(value) = FieldValue::parse(*field, cell)? {
            attributes.set(field.name, value);
        }
    }
    Ok(attributes)
}

fn log_fingerprint(entity: EntityKind, fingerprint: Option<String>) {
    debug!(
        "event=import_row module=csv_io status=ok table={} fingerprint={}",
        entity.table_name(),
        fingerprint.as_deref().unwrap_or("none")
    );
}
