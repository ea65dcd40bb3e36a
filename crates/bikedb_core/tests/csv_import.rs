use bikedb_core::csv_io::templates::template_header;
use bikedb_core::db::open_db_in_memory;
use bikedb_core::{
    import_input_dir, import_reader, AttributeError, CatalogService, ComponentKey, ComponentKind,
    EntityKind, FieldValue, ImportError, RepoError, RowError, SqliteCatalogRepository,
};
use std::fs;

/// Renders a pipe-delimited file with the full header and the given cells.
fn csv_file(entity: EntityKind, rows: &[&[(&str, &str)]]) -> String {
    let header = template_header(entity);
    let mut lines = vec![header.join("|")];
    for row in rows {
        let cells = header
            .iter()
            .map(|column| {
                row.iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, value)| *value)
                    .unwrap_or("")
            })
            .collect::<Vec<_>>();
        lines.push(cells.join("|"));
    }
    lines.join("\n") + "\n"
}

const FORK: EntityKind = EntityKind::Component(ComponentKind::Fork);

#[test]
fn frame_rows_are_coerced_and_stored() {
    let conn = open_db_in_memory().unwrap();
    let content = csv_file(
        EntityKind::Frame,
        &[&[
            ("serial", " FR001 "),
            ("brand", "Acme"),
            ("model_year", "1986"),
            ("seat_tube_c2c_cm", "56.5"),
            ("seat_tube_wall_thickness", "0.9, 0.6, 0.9"),
            ("braze_ons", r#"{"rack":"rear"}"#),
            ("purchase_date", "2021-04-02"),
        ]],
    );

    let report = import_reader(&conn, EntityKind::Frame, content.as_bytes()).unwrap();
    assert_eq!(report.rows_read, 1);
    assert_eq!(report.committed, 1);
    assert!(report.is_clean());

    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let frame = service.get_frame("FR001").unwrap().unwrap();
    assert_eq!(frame.attributes.get("model_year"), Some(&FieldValue::Int(1986)));
    assert_eq!(
        frame.attributes.get("seat_tube_wall_thickness"),
        Some(&FieldValue::FloatList(vec![0.9, 0.6, 0.9]))
    );
    assert_eq!(
        frame.attributes.get("braze_ons"),
        Some(&FieldValue::map([("rack", "rear")]))
    );
    assert_eq!(frame.attributes.get("serial_location"), None);
}

#[test]
fn failing_rows_do_not_block_the_rest() {
    let conn = open_db_in_memory().unwrap();
    let frames = csv_file(
        EntityKind::Frame,
        &[&[("serial", "FR001")], &[("serial", "FR002")]],
    );
    import_reader(&conn, EntityKind::Frame, frames.as_bytes()).unwrap();

    let forks = csv_file(
        FORK,
        &[
            &[
                ("frame_serial", "FR001"),
                ("manufacturer", "Acme"),
                ("component_group", "Road"),
                ("model_name", "R1"),
            ],
            &[
                ("frame_serial", "GHOST"),
                ("manufacturer", "Acme"),
                ("component_group", "Road"),
                ("model_name", "R1"),
            ],
            &[
                ("frame_serial", "FR002"),
                ("component_group", "Road"),
                ("model_name", "R1"),
            ],
            &[
                ("frame_serial", "FR002"),
                ("manufacturer", "Acme"),
                ("component_group", "Road"),
                ("model_name", "R1"),
                ("steerer_length_mm", "long"),
            ],
            &[
                ("frame_serial", "FR001"),
                ("manufacturer", "Acme"),
                ("component_group", "Road"),
                ("model_name", "R1"),
            ],
            &[
                ("frame_serial", "FR002"),
                ("manufacturer", "Acme"),
                ("component_group", "Road"),
                ("model_name", "R1"),
                ("stamped_codes", r#"{"steerer":"77"}"#),
            ],
        ],
    );

    let report = import_reader(&conn, FORK, forks.as_bytes()).unwrap();
    assert_eq!(report.rows_read, 6);
    assert_eq!(report.committed, 2);

    let lines = report
        .failures
        .iter()
        .map(|failure| failure.line)
        .collect::<Vec<_>>();
    assert_eq!(lines, vec![3, 4, 5, 6]);

    assert!(matches!(
        report.failures[0].reason,
        RowError::Repo(RepoError::ReferentialIntegrity { .. })
    ));
    assert!(matches!(
        report.failures[1].reason,
        RowError::Attribute(AttributeError::MissingAttribute("manufacturer"))
    ));
    assert!(matches!(
        report.failures[2].reason,
        RowError::Attribute(AttributeError::TypeMismatch {
            field: "steerer_length_mm",
            ..
        })
    ));
    assert!(matches!(
        report.failures[3].reason,
        RowError::Repo(RepoError::DuplicateKey { .. })
    ));

    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let stamped = ComponentKey::new("FR002", "Acme", "Road", "R1").with_code("steerer", "77");
    assert!(service
        .get_component(ComponentKind::Fork, &stamped)
        .unwrap()
        .is_some());
    assert_eq!(
        service.frame_assembly("FR001").unwrap().unwrap().component_count(),
        1
    );
}

#[test]
fn short_row_is_reported_not_fatal() {
    let conn = open_db_in_memory().unwrap();
    let mut content = csv_file(EntityKind::Frame, &[&[("serial", "FR001")]]);
    content.push_str("FR002|only-two\n");

    let report = import_reader(&conn, EntityKind::Frame, content.as_bytes()).unwrap();
    assert_eq!(report.committed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].line, 3);
    assert!(matches!(report.failures[0].reason, RowError::Csv(_)));
}

#[test]
fn header_mismatch_rejects_the_whole_file() {
    let conn = open_db_in_memory().unwrap();
    let mut header = template_header(EntityKind::Frame);
    header.retain(|name| *name != "brand");
    header.push("colour");
    let content = format!("{}\n{}\n", header.join("|"), "FR001");

    match import_reader(&conn, EntityKind::Frame, content.as_bytes()) {
        Err(ImportError::SchemaMismatch {
            table,
            missing,
            unexpected,
        }) => {
            assert_eq!(table, "frame");
            assert_eq!(missing, vec!["brand".to_string()]);
            assert_eq!(unexpected, vec!["colour".to_string()]);
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }

    let frames: i64 = conn
        .query_row("SELECT COUNT(*) FROM frame;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(frames, 0);
}

#[test]
fn import_input_dir_loads_frames_before_components() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("fork.csv"),
        csv_file(
            FORK,
            &[&[
                ("frame_serial", "FR001"),
                ("manufacturer", "Acme"),
                ("component_group", "Road"),
                ("model_name", "R1"),
            ]],
        ),
    )
    .unwrap();
    fs::write(
        dir.path().join("frame.csv"),
        csv_file(EntityKind::Frame, &[&[("serial", "FR001")]]),
    )
    .unwrap();

    let conn = open_db_in_memory().unwrap();
    let imports = import_input_dir(&conn, dir.path());

    let tables = imports
        .iter()
        .map(|import| import.entity.table_name())
        .collect::<Vec<_>>();
    assert_eq!(tables, vec!["frame", "fork"]);
    assert!(imports.iter().all(|import| import.is_clean()));

    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let assembly = service.frame_assembly("FR001").unwrap().unwrap();
    assert_eq!(assembly.components_of(ComponentKind::Fork).len(), 1);
}

#[test]
fn import_input_dir_with_no_files_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db_in_memory().unwrap();
    assert!(import_input_dir(&conn, dir.path()).is_empty());
}

#[test]
fn bad_file_does_not_hide_committed_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("frame.csv"),
        csv_file(EntityKind::Frame, &[&[("serial", "FR001")]]),
    )
    .unwrap();
    fs::write(dir.path().join("fork.csv"), "bogus|header\nFR001|x\n").unwrap();
    fs::write(
        dir.path().join("hub.csv"),
        csv_file(
            EntityKind::Component(ComponentKind::Hub),
            &[&[
                ("frame_serial", "FR001"),
                ("manufacturer", "Acme"),
                ("component_group", "Road"),
                ("model_name", "H1"),
            ]],
        ),
    )
    .unwrap();

    let conn = open_db_in_memory().unwrap();
    let imports = import_input_dir(&conn, dir.path());
    assert_eq!(imports.len(), 3);

    assert_eq!(imports[0].entity, EntityKind::Frame);
    assert_eq!(imports[0].outcome.as_ref().unwrap().committed, 1);

    assert_eq!(imports[1].entity, FORK);
    assert!(imports[1].path.ends_with("fork.csv"));
    assert!(matches!(
        imports[1].outcome,
        Err(ImportError::SchemaMismatch { table: "fork", .. })
    ));
    assert!(!imports[1].is_clean());

    assert_eq!(
        imports[2].entity,
        EntityKind::Component(ComponentKind::Hub)
    );
    assert_eq!(imports[2].outcome.as_ref().unwrap().committed, 1);

    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let assembly = service.frame_assembly("FR001").unwrap().unwrap();
    assert_eq!(assembly.components_of(ComponentKind::Hub).len(), 1);
    assert!(assembly.components_of(ComponentKind::Fork).is_empty());
}
