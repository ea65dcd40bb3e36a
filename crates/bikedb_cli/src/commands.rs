//! Command handlers.

use crate::args::{FingerprintArgs, ImportArgs, ShowArgs};
use bikedb_core::csv_io::import::{import_file, import_input_dir, ImportReport};
use bikedb_core::csv_io::templates::{export_templates, setup_input as prepare_input};
use bikedb_core::{
    derive_identity, open_db, CatalogConfig, CatalogService, EntityKind, IdentityFields,
    SqliteCatalogRepository,
};
use miette::{miette, IntoDiagnostic, Result};

pub fn init(config: &CatalogConfig) -> Result<()> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).into_diagnostic()?;
    }
    open_db(&config.database_path).into_diagnostic()?;
    println!("Catalog ready at {}", config.database_path.display());
    Ok(())
}

pub fn templates(config: &CatalogConfig) -> Result<()> {
    let written = export_templates(&config.templates_dir).into_diagnostic()?;
    println!(
        "Wrote {} templates to {}",
        written.len(),
        config.templates_dir.display()
    );
    Ok(())
}

pub fn setup_input(config: &CatalogConfig) -> Result<()> {
    let setup = prepare_input(&config.templates_dir, &config.input_dir).into_diagnostic()?;
    if setup.templates_exported {
        println!("Exported templates to {}", config.templates_dir.display());
    }
    for path in &setup.created {
        println!("created  {}", path.display());
    }
    for path in &setup.skipped {
        println!("kept     {}", path.display());
    }
    Ok(())
}

pub fn import(config: &CatalogConfig, args: &ImportArgs) -> Result<()> {
    let entity = EntityKind::from_table_name(&args.table).ok_or_else(|| {
        let known = EntityKind::all()
            .into_iter()
            .map(|entity| entity.table_name())
            .collect::<Vec<_>>()
            .join(", ");
        miette!("unknown table `{}`; expected one of: {known}", args.table)
    })?;

    let conn = open_db(&config.database_path).into_diagnostic()?;
    let report = import_file(&conn, entity, &args.file).into_diagnostic()?;
    print_report(&report);
    check_reports(std::slice::from_ref(&report))
}

pub fn import_all(config: &CatalogConfig) -> Result<()> {
    let conn = open_db(&config.database_path).into_diagnostic()?;
    let imports = import_input_dir(&conn, &config.input_dir);
    if imports.is_empty() {
        println!("No input files found in {}", config.input_dir.display());
    }

    let mut reports = Vec::new();
    let mut failed_files = 0usize;
    for import in imports {
        match import.outcome {
            Ok(report) => {
                print_report(&report);
                reports.push(report);
            }
            Err(err) => {
                failed_files += 1;
                eprintln!(
                    "{:<20} {}: {err}",
                    import.entity.table_name(),
                    import.path.display()
                );
            }
        }
    }

    if failed_files > 0 {
        return Err(miette!("{failed_files} file(s) could not be imported"));
    }
    check_reports(&reports)
}

pub fn show(config: &CatalogConfig, args: &ShowArgs) -> Result<()> {
    let conn = open_db(&config.database_path).into_diagnostic()?;
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).into_diagnostic()?);
    let assembly = service
        .frame_assembly(&args.serial)
        .into_diagnostic()?
        .ok_or_else(|| miette!("frame `{}` not found", args.serial))?;

    let json = serde_json::to_string_pretty(&assembly).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

pub fn fingerprint(args: &FingerprintArgs) -> Result<()> {
    let fields = IdentityFields {
        production_year: args.year,
        manufacturer: args.manufacturer.clone(),
        model_name: args.model.clone(),
        purchase_date: args.purchase_date,
    };
    println!("{}", derive_identity(&fields));
    Ok(())
}

fn print_report(report: &ImportReport) {
    println!(
        "{:<20} rows={} committed={} failed={}",
        report.entity.table_name(),
        report.rows_read,
        report.committed,
        report.failures.len()
    );
    for failure in &report.failures {
        eprintln!("  line {}: {}", failure.line, failure.reason);
    }
}

fn check_reports(reports: &[ImportReport]) -> Result<()> {
    let failed = reports
        .iter()
        .map(|report| report.failures.len())
        .sum::<usize>();
    if failed > 0 {
        return Err(miette!("{failed} row(s) were rejected"));
    }
    Ok(())
}
