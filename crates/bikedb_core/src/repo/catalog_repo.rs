//! Catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the frame table and every component table.
//! - Maintain the one-frame-to-many-components relationship.
//! - Translate SQLite constraint failures into semantic errors.
//!
//! # Invariants
//! - Write paths validate records before any SQL mutation.
//! - A component insert for an unknown frame fails with `ReferentialIntegrity`.
//! - A frame delete while components reference it fails with
//!   `ReferentialIntegrity`; nothing cascades.
//! - Read paths reject stored values that do not fit the registry.

use crate::db::schema::{schema_version, SCHEMA_VERSION};
use crate::db::DbError;
use crate::logging::loggable;
use crate::model::entity::{ComponentKind, EntityKind, COMPONENT_KEY_COLUMNS, FRAME_KEY_COLUMN};
use crate::model::field::FieldDef;
use crate::model::record::{Component, ComponentKey, Frame};
use crate::model::value::{AttributeError, Attributes, FieldMap, FieldValue};
use crate::repo::columns::{from_sql_value, to_sql_value};
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed attribute validation before reaching SQL.
    Validation(AttributeError),
    Db(DbError),
    /// No row matched the given key.
    NotFound { table: &'static str, key: String },
    /// Insert collided with an existing primary key.
    DuplicateKey { table: &'static str, key: String },
    /// A component references a missing frame, or a referenced frame was
    /// about to be deleted.
    ReferentialIntegrity { table: &'static str, message: String },
    /// Connection schema is not at the expected version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, key } => write!(f, "{table} not found: {key}"),
            Self::DuplicateKey { table, key } => {
                write!(f, "duplicate key in `{table}`: {key}")
            }
            Self::ReferentialIntegrity { table, message } => {
                write!(f, "referential integrity violation on `{table}`: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AttributeError> for RepoError {
    fn from(value: AttributeError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the frame/component relationship graph.
pub trait CatalogRepository {
    fn create_frame(&self, frame: &Frame) -> RepoResult<()>;
    fn update_frame(&self, frame: &Frame) -> RepoResult<()>;
    fn get_frame(&self, serial: &str) -> RepoResult<Option<Frame>>;
    /// Lists all frames ordered by serial.
    fn list_frames(&self) -> RepoResult<Vec<Frame>>;
    /// Hard-deletes a frame that no component references.
    fn delete_frame(&self, serial: &str) -> RepoResult<()>;
    fn create_component(&self, component: &Component) -> RepoResult<()>;
    fn get_component(
        &self,
        kind: ComponentKind,
        key: &ComponentKey,
    ) -> RepoResult<Option<Component>>;
    /// Lists components of one kind attached to a frame, ordered by key.
    fn list_components(&self, frame_serial: &str, kind: ComponentKind)
        -> RepoResult<Vec<Component>>;
    /// Counts components of every kind attached to a frame.
    fn count_components(&self, frame_serial: &str) -> RepoResult<usize>;
    fn delete_component(&self, kind: ComponentKind, key: &ComponentKey) -> RepoResult<()>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Constructs a repository over a connection with all catalog tables.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version does not match.
    /// - `MissingRequiredTable` when a catalog table is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version = schema_version(conn)?;
        if actual_version != SCHEMA_VERSION {
            return Err(RepoError::UninitializedConnection {
                expected_version: SCHEMA_VERSION,
                actual_version,
            });
        }

        for kind in EntityKind::all() {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
                [kind.table_name()],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(RepoError::MissingRequiredTable(kind.table_name()));
            }
        }

        Ok(Self { conn })
    }

    fn frame_exists(&self, serial: &str) -> RepoResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM frame WHERE serial = ?1);",
            [serial],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn insert_row(&self, entity: EntityKind, values: &[Value], key: String) -> RepoResult<()> {
        let columns = column_list(entity);
        let placeholders = (1..=values.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders});",
            entity.table_name()
        );

        self.conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|err| map_constraint_error(err, entity.table_name(), key))?;
        Ok(())
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_frame(&self, frame: &Frame) -> RepoResult<()> {
        frame.validate()?;
        let values = encode_row(frame.row_values());
        self.insert_row(EntityKind::Frame, &values, frame.serial.clone())?;
        debug!(
            "event=frame_create module=repo status=ok serial={}",
            loggable(&frame.serial)
        );
        Ok(())
    }

    fn update_frame(&self, frame: &Frame) -> RepoResult<()> {
        frame.validate()?;

        let rows = frame.row_values();
        let mut assignments = Vec::new();
        let mut values = Vec::new();
        for (field, value) in &rows {
            if field.name == FRAME_KEY_COLUMN {
                continue;
            }
            values.push(to_sql_value(value.as_ref()));
            assignments.push(format!("{} = ?{}", field.name, values.len()));
        }
        values.push(Value::Text(frame.serial.clone()));
        let sql = format!(
            "UPDATE frame SET {} WHERE serial = ?{};",
            assignments.join(", "),
            values.len()
        );

        let changed = self
            .conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|err| map_constraint_error(err, "frame", frame.serial.clone()))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "frame",
                key: frame.serial.clone(),
            });
        }
        Ok(())
    }

    fn get_frame(&self, serial: &str) -> RepoResult<Option<Frame>> {
        let sql = format!(
            "SELECT {} FROM frame WHERE serial = ?1;",
            column_list(EntityKind::Frame)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([serial])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_frame_row(row)?));
        }
        Ok(None)
    }

    fn list_frames(&self) -> RepoResult<Vec<Frame>> {
        let sql = format!(
            "SELECT {} FROM frame ORDER BY serial ASC;",
            column_list(EntityKind::Frame)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut frames = Vec::new();
        while let Some(row) = rows.next()? {
            frames.push(parse_frame_row(row)?);
        }
        Ok(frames)
    }

    fn delete_frame(&self, serial: &str) -> RepoResult<()> {
        let dependents = self.count_components(serial)?;
        if dependents > 0 {
            warn!(
                "event=frame_delete module=repo status=error error_code=frame_referenced dependents={dependents}"
            );
            return Err(RepoError::ReferentialIntegrity {
                table: "frame",
                message: format!("frame `{serial}` is referenced by {dependents} component(s)"),
            });
        }

        let changed = self
            .conn
            .execute("DELETE FROM frame WHERE serial = ?1;", [serial])
            .map_err(|err| map_constraint_error(err, "frame", serial.to_string()))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "frame",
                key: serial.to_string(),
            });
        }
        Ok(())
    }

    fn create_component(&self, component: &Component) -> RepoResult<()> {
        component.validate()?;
        let table = component.kind.table_name();

        if !self.frame_exists(&component.key.frame_serial)? {
            return Err(RepoError::ReferentialIntegrity {
                table,
                message: format!("frame `{}` does not exist", component.key.frame_serial),
            });
        }

        let values = encode_row(component.row_values());
        self.insert_row(component.entity(), &values, component.key.to_string())?;
        debug!(
            "event=component_create module=repo status=ok table={table} frame_serial={}",
            loggable(&component.key.frame_serial)
        );
        Ok(())
    }

    fn get_component(
        &self,
        kind: ComponentKind,
        key: &ComponentKey,
    ) -> RepoResult<Option<Component>> {
        let entity = EntityKind::Component(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE {};",
            column_list(entity),
            kind.table_name(),
            key_predicate()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(key_values(key)))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_component_row(kind, row)?));
        }
        Ok(None)
    }

    fn list_components(
        &self,
        frame_serial: &str,
        kind: ComponentKind,
    ) -> RepoResult<Vec<Component>> {
        let entity = EntityKind::Component(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE frame_serial = ?1
             ORDER BY manufacturer ASC, component_group ASC, model_name ASC, stamped_codes ASC;",
            column_list(entity),
            kind.table_name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![frame_serial])?;
        let mut components = Vec::new();
        while let Some(row) = rows.next()? {
            components.push(parse_component_row(kind, row)?);
        }
        Ok(components)
    }

    fn count_components(&self, frame_serial: &str) -> RepoResult<usize> {
        let mut total = 0usize;
        for kind in ComponentKind::ALL {
            let count: i64 = self.conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE frame_serial = ?1;",
                    kind.table_name()
                ),
                [frame_serial],
                |row| row.get(0),
            )?;
            total += usize::try_from(count).map_err(|_| {
                RepoError::InvalidData(format!("negative row count in `{}`", kind.table_name()))
            })?;
        }
        Ok(total)
    }

    fn delete_component(&self, kind: ComponentKind, key: &ComponentKey) -> RepoResult<()> {
        let sql = format!("DELETE FROM {} WHERE {};", kind.table_name(), key_predicate());
        let changed = self.conn.execute(&sql, params_from_iter(key_values(key)))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: kind.table_name(),
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

fn column_list(entity: EntityKind) -> String {
    entity
        .columns()
        .iter()
        .map(|field| field.name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn key_predicate() -> String {
    COMPONENT_KEY_COLUMNS
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn key_values(key: &ComponentKey) -> [Value; 5] {
    [
        Value::Text(key.frame_serial.clone()),
        Value::Text(key.manufacturer.clone()),
        Value::Text(key.component_group.clone()),
        Value::Text(key.model_name.clone()),
        Value::Text(key.stamped_codes_json()),
    ]
}

fn encode_row(rows: Vec<(FieldDef, Option<FieldValue>)>) -> Vec<Value> {
    rows.iter()
        .map(|(_, value)| to_sql_value(value.as_ref()))
        .collect()
}

fn map_constraint_error(err: rusqlite::Error, table: &'static str, key: String) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                return RepoError::DuplicateKey { table, key };
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return RepoError::ReferentialIntegrity {
                    table,
                    message: format!("foreign key constraint failed for {key}"),
                };
            }
            _ => {}
        }
    }
    err.into()
}

/// Reads every declared column of `entity` into a flat attribute set.
fn read_attributes(entity: EntityKind, row: &Row<'_>) -> RepoResult<Attributes> {
    let mut attributes = Attributes::new();
    for (index, field) in entity.columns().into_iter().enumerate() {
        let raw = row.get_ref(index)?;
        let value = from_sql_value(field, raw).map_err(|reason| {
            RepoError::InvalidData(format!(
                "{}.{}: {reason}",
                entity.table_name(),
                field.name
            ))
        })?;
        if let Some(value) = value {
            attributes.set(field.name, value);
        }
    }
    Ok(attributes)
}

fn parse_frame_row(row: &Row<'_>) -> RepoResult<Frame> {
    let attributes = read_attributes(EntityKind::Frame, row)?;
    let frame = Frame::from_attributes(attributes).map_err(|err| {
        RepoError::InvalidData(format!("frame row cannot be rebuilt: {err}"))
    })?;
    frame.validate()?;
    Ok(frame)
}

fn parse_component_row(kind: ComponentKind, row: &Row<'_>) -> RepoResult<Component> {
    let mut attributes = read_attributes(EntityKind::Component(kind), row)?;
    if attributes.get("stamped_codes").is_none() {
        attributes.set("stamped_codes", FieldMap::new());
    }
    let component = Component::from_attributes(kind, attributes).map_err(|err| {
        RepoError::InvalidData(format!("{kind} row cannot be rebuilt: {err}"))
    })?;
    component.validate()?;
    Ok(component)
}
