use bikedb_core::db::open_db_in_memory;
use bikedb_core::{
    init_logging, CatalogService, Component, ComponentKey, ComponentKind, Frame,
    SqliteCatalogRepository,
};
use std::fs;

#[test]
fn serial_with_newline_stays_on_one_log_line() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");
    let handle = init_logging("debug", log_dir.to_str().unwrap()).unwrap();

    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let serial = "X\nevent=forged st";
    let key = ComponentKey::new(serial, "Acme", "Road", "S1");
    service.add_frame(&Frame::new(serial)).unwrap();
    service
        .add_component(&Component::new(ComponentKind::Stem, key.clone()))
        .unwrap();
    service.remove_component(ComponentKind::Stem, &key).unwrap();
    service.remove_frame(serial).unwrap();
    handle.flush();

    let mut content = String::new();
    for entry in fs::read_dir(&log_dir).unwrap() {
        content.push_str(&fs::read_to_string(entry.unwrap().path()).unwrap());
    }

    assert!(content.contains("serial=X event=forged st"));
    assert!(content
        .lines()
        .all(|line| !line.trim_start().starts_with("event=forged")));
}
