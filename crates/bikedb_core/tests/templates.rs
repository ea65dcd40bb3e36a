use bikedb_core::csv_io::templates::{
    export_templates, input_file_name, setup_input, template_file_name, template_header,
};
use bikedb_core::db::open_db_in_memory;
use bikedb_core::{import_file, ComponentKind, EntityKind};
use std::fs;

#[test]
fn export_writes_one_template_per_table() {
    let dir = tempfile::tempdir().unwrap();
    let templates_dir = dir.path().join("templates");

    let written = export_templates(&templates_dir).unwrap();
    assert_eq!(written.len(), EntityKind::all().len());
    assert_eq!(written[0], templates_dir.join("frame_template.csv"));
    for entity in EntityKind::all() {
        assert!(templates_dir.join(template_file_name(entity)).is_file());
    }
}

#[test]
fn template_header_lists_columns_in_declaration_order() {
    let dir = tempfile::tempdir().unwrap();
    export_templates(dir.path()).unwrap();

    for entity in EntityKind::all() {
        let content = fs::read_to_string(dir.path().join(template_file_name(entity))).unwrap();
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 1, "{entity} template has extra rows");

        let names = lines[0].split('|').collect::<Vec<_>>();
        let declared = entity
            .columns()
            .iter()
            .map(|field| field.name)
            .collect::<Vec<_>>();
        assert_eq!(names, declared);
        assert_eq!(names, template_header(entity));
    }
}

#[test]
fn exported_templates_are_accepted_by_import() {
    let dir = tempfile::tempdir().unwrap();
    let written = export_templates(dir.path()).unwrap();
    let conn = open_db_in_memory().unwrap();

    for (entity, path) in EntityKind::all().into_iter().zip(written) {
        let report = import_file(&conn, entity, &path).unwrap();
        assert_eq!(report.rows_read, 0);
        assert!(report.is_clean());
    }
}

#[test]
fn export_overwrites_stale_template() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("frame_template.csv");
    fs::write(&stale, "old|header\n").unwrap();

    export_templates(dir.path()).unwrap();
    let content = fs::read_to_string(&stale).unwrap();
    assert!(content.starts_with("serial|"));
}

#[test]
fn setup_input_exports_missing_templates_and_strips_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let templates_dir = dir.path().join("templates");
    let input_dir = dir.path().join("input");

    let setup = setup_input(&templates_dir, &input_dir).unwrap();
    assert!(setup.templates_exported);
    assert_eq!(setup.created.len(), EntityKind::all().len());
    assert!(setup.skipped.is_empty());

    let fork = EntityKind::Component(ComponentKind::Fork);
    let copied = fs::read_to_string(input_dir.join(input_file_name(fork))).unwrap();
    let template = fs::read_to_string(templates_dir.join(template_file_name(fork))).unwrap();
    assert_eq!(copied, template);
    assert!(!input_dir.join("fork_template.csv").exists());
}

#[test]
fn setup_input_keeps_existing_input_files() {
    let dir = tempfile::tempdir().unwrap();
    let templates_dir = dir.path().join("templates");
    let input_dir = dir.path().join("input");
    export_templates(&templates_dir).unwrap();
    fs::create_dir_all(&input_dir).unwrap();

    let filled = input_dir.join("frame.csv");
    fs::write(&filled, "user data\n").unwrap();

    let setup = setup_input(&templates_dir, &input_dir).unwrap();
    assert!(!setup.templates_exported);
    assert_eq!(setup.skipped, vec![filled.clone()]);
    assert_eq!(setup.created.len(), EntityKind::all().len() - 1);
    assert_eq!(fs::read_to_string(&filled).unwrap(), "user data\n");
}

#[test]
fn setup_input_only_copies_catalog_tables() {
    let dir = tempfile::tempdir().unwrap();
    let templates_dir = dir.path().join("templates");
    let input_dir = dir.path().join("input");
    export_templates(&templates_dir).unwrap();
    fs::write(templates_dir.join("notes.txt"), "scratch").unwrap();
    fs::write(templates_dir.join("bike_template.csv"), "serial|colour\n").unwrap();

    let setup = setup_input(&templates_dir, &input_dir).unwrap();
    assert_eq!(setup.created.len(), EntityKind::all().len());
    assert!(!input_dir.join("notes.txt").exists());
    assert!(!input_dir.join("bike.csv").exists());
    assert_eq!(
        fs::read_dir(&input_dir).unwrap().count(),
        EntityKind::all().len()
    );
}
