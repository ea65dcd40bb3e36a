//! Catalog DDL generated from the field registry.
//!
//! # Responsibility
//! - Render one `CREATE TABLE` statement per catalog table.
//! - Create all tables in a single transaction and stamp the schema version.
//!
//! # Invariants
//! - Component tables declare `frame_serial REFERENCES frame(serial)` without
//!   cascading deletes.
//! - There is one schema version; a database stamped newer is rejected.

use crate::db::{DbError, DbResult};
use crate::model::entity::{EntityKind, FRAME_KEY_COLUMN};
use crate::model::field::FieldType;
use log::info;
use rusqlite::Connection;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

/// Renders the `CREATE TABLE IF NOT EXISTS` statement for one table.
pub fn table_ddl(kind: EntityKind) -> String {
    let keys = kind.key_columns();
    let mut lines: Vec<String> = kind
        .columns()
        .iter()
        .map(|field| {
            let mut line = format!("    {} {}", field.name, field.ty.sql_type(field.name));
            if keys.contains(&field.name) {
                line.push_str(" NOT NULL");
                if field.ty == FieldType::Map {
                    line.push_str(" DEFAULT '{}'");
                }
            }
            if matches!(kind, EntityKind::Component(_)) && field.name == "frame_serial" {
                line.push_str(&format!(" REFERENCES frame({FRAME_KEY_COLUMN})"));
            }
            line
        })
        .collect();
    lines.push(format!("    PRIMARY KEY ({})", keys.join(", ")));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        kind.table_name(),
        lines.join(",\n")
    )
}

/// Creates every catalog table that does not exist yet.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database was stamped by a newer build.
/// - `Sqlite` when DDL execution fails; no table is created in that case.
pub fn create_all_tables(conn: &mut Connection) -> DbResult<()> {
    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    for kind in EntityKind::all() {
        tx.execute_batch(&table_ddl(kind))?;
    }
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    if current < SCHEMA_VERSION {
        info!(
            "event=schema_create module=db status=ok tables={} version={SCHEMA_VERSION}",
            EntityKind::all().len()
        );
    }
    Ok(())
}

/// Reads the schema version stamped on the database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
