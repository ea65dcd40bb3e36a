use bikedb_core::db::schema::{schema_version, SCHEMA_VERSION};
use bikedb_core::db::{open_db, open_db_in_memory, DbError};
use bikedb_core::{EntityKind, RepoError, SqliteCatalogRepository};
use rusqlite::Connection;

fn table_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table';",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn open_creates_every_table() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(table_count(&conn), EntityKind::all().len() as i64);
    assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
}

#[test]
fn foreign_keys_are_enabled() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn reopening_a_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        conn.execute("INSERT INTO frame (serial) VALUES ('FR001');", [])
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let serials: i64 = conn
        .query_row("SELECT COUNT(*) FROM frame;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(serials, 1);
    assert_eq!(table_count(&conn), EntityKind::all().len() as i64);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(&format!("PRAGMA user_version = {};", SCHEMA_VERSION + 1))
            .unwrap();
    }

    match open_db(&path) {
        Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        }) => {
            assert_eq!(db_version, SCHEMA_VERSION + 1);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("expected unsupported version, got {other:?}"),
    }
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();
    match SqliteCatalogRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, SCHEMA_VERSION);
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("raw connection must be rejected"),
    }
}

#[test]
fn repository_rejects_missing_table() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE headset;").unwrap();
    match SqliteCatalogRepository::try_new(&conn) {
        Err(RepoError::MissingRequiredTable(table)) => assert_eq!(table, "headset"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("missing table must be rejected"),
    }
}
