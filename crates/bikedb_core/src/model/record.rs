//! Frame and component records.
//!
//! # Responsibility
//! - Carry the identity of a row in typed fields and the rest as `Attributes`.
//! - Split a flat attribute set (e.g. one CSV row) into key plus attributes.
//! - Produce column-ordered values for persistence.
//!
//! # Invariants
//! - A frame is identified by its caller-supplied `serial`.
//! - A component is identified by `ComponentKey`; two components are the same
//!   row iff every key part matches.
//! - Key strings are non-empty and at most 20 characters.

use crate::model::entity::{ComponentKind, EntityKind, COMPONENT_KEY_COLUMNS, FRAME_KEY_COLUMN};
use crate::model::field::{FieldDef, FieldType, TEXT_20};
use crate::model::value::{check_value, AttributeError, Attributes, FieldMap, FieldValue};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Root bicycle entity; every component attaches to exactly one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub serial: String,
    pub attributes: Attributes,
}

impl Frame {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.attributes.set(name, value);
        self
    }

    /// Lifts `serial` out of a flat attribute set.
    ///
    /// # Errors
    /// - `MissingAttribute("serial")` when the serial is unset.
    /// - `TypeMismatch` when the serial is not text.
    pub fn from_attributes(mut attributes: Attributes) -> Result<Self, AttributeError> {
        let serial = take_key_text(&mut attributes, EntityKind::Frame, FRAME_KEY_COLUMN)?;
        Ok(Self { serial, attributes })
    }

    /// Validates the serial and every attribute against the frame columns.
    pub fn validate(&self) -> Result<(), AttributeError> {
        check_key_text(EntityKind::Frame, FRAME_KEY_COLUMN, &self.serial)?;
        self.attributes.validate(EntityKind::Frame)
    }

    /// Column-ordered values, `None` for unset columns.
    pub fn row_values(&self) -> Vec<(FieldDef, Option<FieldValue>)> {
        EntityKind::Frame
            .columns()
            .into_iter()
            .map(|field| {
                let value = if field.name == FRAME_KEY_COLUMN {
                    Some(FieldValue::Text(self.serial.clone()))
                } else {
                    self.attributes.get(field.name).cloned()
                };
                (field, value)
            })
            .collect()
    }
}

/// Composite natural key shared by every component table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentKey {
    /// Serial of the owning frame.
    pub frame_serial: String,
    pub manufacturer: String,
    pub component_group: String,
    pub model_name: String,
    pub stamped_codes: FieldMap,
}

impl ComponentKey {
    pub fn new(
        frame_serial: impl Into<String>,
        manufacturer: impl Into<String>,
        component_group: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            frame_serial: frame_serial.into(),
            manufacturer: manufacturer.into(),
            component_group: component_group.into(),
            model_name: model_name.into(),
            stamped_codes: FieldMap::new(),
        }
    }

    /// Adds one stamped code entry.
    pub fn with_code(mut self, name: impl Into<String>, code: impl Into<String>) -> Self {
        self.stamped_codes
            .insert(name.into(), serde_json::Value::String(code.into()));
        self
    }

    /// Canonical JSON of `stamped_codes`; keys are sorted.
    pub fn stamped_codes_json(&self) -> String {
        serde_json::Value::Object(self.stamped_codes.clone()).to_string()
    }

    fn validate(&self, entity: EntityKind) -> Result<(), AttributeError> {
        check_key_text(entity, "frame_serial", &self.frame_serial)?;
        check_key_text(entity, "manufacturer", &self.manufacturer)?;
        check_key_text(entity, "component_group", &self.component_group)?;
        check_key_text(entity, "model_name", &self.model_name)
    }
}

impl Display for ComponentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frame_serial={} manufacturer={} component_group={} model_name={} stamped_codes={}",
            self.frame_serial,
            self.manufacturer,
            self.component_group,
            self.model_name,
            self.stamped_codes_json()
        )
    }
}

/// One replaceable part attached to a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub kind: ComponentKind,
    pub key: ComponentKey,
    pub attributes: Attributes,
}

impl Component {
    pub fn new(kind: ComponentKind, key: ComponentKey) -> Self {
        Self {
            kind,
            key,
            attributes: Attributes::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.attributes.set(name, value);
        self
    }

    pub fn entity(&self) -> EntityKind {
        EntityKind::Component(self.kind)
    }

    /// Lifts the composite key out of a flat attribute set.
    ///
    /// An unset `stamped_codes` becomes an empty map.
    ///
    /// # Errors
    /// - `MissingAttribute` for the first unset text key part.
    /// - `TypeMismatch` when a key part has the wrong value type.
    pub fn from_attributes(
        kind: ComponentKind,
        mut attributes: Attributes,
    ) -> Result<Self, AttributeError> {
        let entity = EntityKind::Component(kind);
        let frame_serial = take_key_text(&mut attributes, entity, "frame_serial")?;
        let manufacturer = take_key_text(&mut attributes, entity, "manufacturer")?;
        let component_group = take_key_text(&mut attributes, entity, "component_group")?;
        let model_name = take_key_text(&mut attributes, entity, "model_name")?;
        let stamped_codes = match attributes.remove("stamped_codes") {
            None => FieldMap::new(),
            Some(FieldValue::Map(map)) => map,
            Some(_) => {
                return Err(AttributeError::TypeMismatch {
                    field: "stamped_codes",
                    expected: FieldType::Map,
                });
            }
        };

        Ok(Self {
            kind,
            key: ComponentKey {
                frame_serial,
                manufacturer,
                component_group,
                model_name,
                stamped_codes,
            },
            attributes,
        })
    }

    pub fn validate(&self) -> Result<(), AttributeError> {
        let entity = self.entity();
        self.key.validate(entity)?;
        self.attributes.validate(entity)
    }

    /// Column-ordered values, `None` for unset columns.
    pub fn row_values(&self) -> Vec<(FieldDef, Option<FieldValue>)> {
        self.entity()
            .columns()
            .into_iter()
            .map(|field| {
                let value = match field.name {
                    "frame_serial" => Some(FieldValue::Text(self.key.frame_serial.clone())),
                    "manufacturer" => Some(FieldValue::Text(self.key.manufacturer.clone())),
                    "component_group" => {
                        Some(FieldValue::Text(self.key.component_group.clone()))
                    }
                    "model_name" => Some(FieldValue::Text(self.key.model_name.clone())),
                    "stamped_codes" => Some(FieldValue::Map(self.key.stamped_codes.clone())),
                    other => self.attributes.get(other).cloned(),
                };
                (field, value)
            })
            .collect()
    }
}

fn take_key_text(
    attributes: &mut Attributes,
    entity: EntityKind,
    name: &'static str,
) -> Result<String, AttributeError> {
    debug_assert!(name == FRAME_KEY_COLUMN || COMPONENT_KEY_COLUMNS.contains(&name));
    match attributes.remove(name) {
        None => Err(AttributeError::MissingAttribute(name)),
        Some(FieldValue::Text(text)) => {
            check_key_text(entity, name, &text)?;
            Ok(text)
        }
        Some(_) => Err(AttributeError::TypeMismatch {
            field: name,
            expected: TEXT_20,
        }),
    }
}

fn check_key_text(entity: EntityKind, name: &'static str, value: &str) -> Result<(), AttributeError> {
    if value.trim().is_empty() {
        return Err(AttributeError::MissingAttribute(name));
    }
    match entity.field(name) {
        Some(field) => check_value(field, &FieldValue::Text(value.to_string())),
        None => Err(AttributeError::UnknownField {
            entity,
            field: name.to_string(),
        }),
    }
}
