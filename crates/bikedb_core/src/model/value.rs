//! Attribute values, coercion from text cells and write-path validation.
//!
//! # Responsibility
//! - Hold typed attribute values keyed by declared column name.
//! - Coerce raw CSV cells into values of a declared `FieldType`.
//! - Validate values against the registry before persistence.
//!
//! # Invariants
//! - Empty cells coerce to "unset", never to a zero value.
//! - Measurements, weights, prices and counts are never negative.
//! - Maps serialize with sorted keys, so equal maps have equal JSON.

use crate::model::entity::EntityKind;
use crate::model::field::{FieldDef, FieldType};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Free-form key/value map stored as a JSON object.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation and coercion failures for entity attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeError {
    /// Attribute name is not declared for the entity (or is a key column).
    UnknownField { entity: EntityKind, field: String },
    /// Value variant does not fit the declared type.
    TypeMismatch {
        field: &'static str,
        expected: FieldType,
    },
    /// Value has the right shape but violates a range or length rule.
    InvalidValue { field: &'static str, message: String },
    /// A key attribute required to identify the row is unset.
    MissingAttribute(&'static str),
}

impl Display for AttributeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { entity, field } => {
                write!(f, "`{field}` is not a writable attribute of `{entity}`")
            }
            Self::TypeMismatch { field, expected } => {
                write!(f, "`{field}` expects a {} value", expected.label())
            }
            Self::InvalidValue { field, message } => write!(f, "invalid `{field}`: {message}"),
            Self::MissingAttribute(field) => write!(f, "missing required attribute `{field}`"),
        }
    }
}

impl Error for AttributeError {}

/// One typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Float(f64),
    /// Years and counts.
    Int(i64),
    Date(NaiveDate),
    Bool(bool),
    Map(FieldMap),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    TextList(Vec<String>),
}

impl FieldValue {
    /// Builds a map value from string pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), serde_json::Value::String(value.into())))
                .collect(),
        )
    }

    /// Coerces one raw text cell into a value of the field's declared type.
    ///
    /// Returns `Ok(None)` for an empty (or whitespace-only) cell.
    ///
    /// # Errors
    /// - `TypeMismatch` when the text cannot be parsed as the declared type.
    /// - `InvalidValue` when the parsed value violates a range or length rule.
    pub fn parse(field: FieldDef, raw: &str) -> Result<Option<Self>, AttributeError> {
        let text = raw.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let mismatch = || AttributeError::TypeMismatch {
            field: field.name,
            expected: field.ty,
        };

        let value = match field.ty {
            FieldType::Text(_) => Self::Text(text.to_string()),
            FieldType::Float2 => Self::Float(text.parse::<f64>().map_err(|_| mismatch())?),
            FieldType::Year | FieldType::Count => {
                Self::Int(text.parse::<i64>().map_err(|_| mismatch())?)
            }
            FieldType::Date => Self::Date(
                NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| mismatch())?,
            ),
            FieldType::Bool => Self::Bool(parse_bool(text).ok_or_else(mismatch)?),
            FieldType::Map => match serde_json::from_str::<serde_json::Value>(text) {
                Ok(serde_json::Value::Object(map)) => Self::Map(map),
                _ => return Err(mismatch()),
            },
            FieldType::IntList => Self::IntList(parse_list(text).ok_or_else(mismatch)?),
            FieldType::FloatList => Self::FloatList(parse_list(text).ok_or_else(mismatch)?),
            FieldType::TextList => Self::TextList(parse_text_list(text).ok_or_else(mismatch)?),
        };

        check_value(field, &value)?;
        Ok(Some(value))
    }

    /// Returns the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<FieldMap> for FieldValue {
    fn from(value: FieldMap) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(value: Vec<f64>) -> Self {
        Self::FloatList(value)
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(value: Vec<i64>) -> Self {
        Self::IntList(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::TextList(value)
    }
}

/// Non-key attribute values of one row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Attributes {
    values: BTreeMap<String, FieldValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Validates every set value against the non-key columns of `entity`.
    ///
    /// # Errors
    /// - `UnknownField` for undeclared names and for key column names.
    /// - `TypeMismatch` / `InvalidValue` for values that break the declared type.
    pub fn validate(&self, entity: EntityKind) -> Result<(), AttributeError> {
        let keys = entity.key_columns();
        for (name, value) in &self.values {
            let field = entity
                .field(name)
                .filter(|field| !keys.contains(&field.name))
                .ok_or_else(|| AttributeError::UnknownField {
                    entity,
                    field: name.clone(),
                })?;
            check_value(field, value)?;
        }
        Ok(())
    }
}

/// Checks one value against its declared field type and range rules.
pub(crate) fn check_value(field: FieldDef, value: &FieldValue) -> Result<(), AttributeError> {
    let invalid = |message: String| AttributeError::InvalidValue {
        field: field.name,
        message,
    };

    match (field.ty, value) {
        (FieldType::Text(max), FieldValue::Text(text)) => {
            let length = text.chars().count();
            if length > max {
                return Err(invalid(format!("{length} characters exceeds limit of {max}")));
            }
        }
        (FieldType::Year, FieldValue::Int(year)) => {
            if !(1000..=9999).contains(year) {
                return Err(invalid(format!("{year} is not a 4-digit year")));
            }
        }
        (FieldType::Float2, FieldValue::Float(number)) => {
            if !number.is_finite() {
                return Err(invalid("value must be finite".to_string()));
            }
        }
        (FieldType::Count, FieldValue::Int(_))
        | (FieldType::Date, FieldValue::Date(_))
        | (FieldType::Bool, FieldValue::Bool(_))
        | (FieldType::Map, FieldValue::Map(_))
        | (FieldType::IntList, FieldValue::IntList(_))
        | (FieldType::TextList, FieldValue::TextList(_)) => {}
        (FieldType::FloatList, FieldValue::FloatList(items)) => {
            if items.iter().any(|item| !item.is_finite()) {
                return Err(invalid("list items must be finite".to_string()));
            }
        }
        _ => {
            return Err(AttributeError::TypeMismatch {
                field: field.name,
                expected: field.ty,
            });
        }
    }

    if field.ty.is_non_negative() && is_negative(value) {
        return Err(invalid("value must not be negative".to_string()));
    }

    Ok(())
}

fn is_negative(value: &FieldValue) -> bool {
    match value {
        FieldValue::Float(number) => *number < 0.0,
        FieldValue::Int(number) => *number < 0,
        FieldValue::FloatList(items) => items.iter().any(|item| *item < 0.0),
        FieldValue::IntList(items) => items.iter().any(|item| *item < 0),
        _ => false,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn parse_list<T>(text: &str) -> Option<Vec<T>>
where
    T: std::str::FromStr + serde::de::DeserializeOwned,
{
    if text.starts_with('[') {
        return serde_json::from_str(text).ok();
    }
    text.split(',')
        .map(|item| item.trim().parse::<T>().ok())
        .collect()
}

fn parse_text_list(text: &str) -> Option<Vec<String>> {
    if text.starts_with('[') {
        return serde_json::from_str(text).ok();
    }
    Some(
        text.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::{AttributeError, Attributes, FieldValue};
    use crate::model::entity::{ComponentKind, EntityKind};
    use crate::model::field::{FieldDef, FieldType};
    use chrono::NaiveDate;

    fn def(name: &'static str, ty: FieldType) -> FieldDef {
        FieldDef::new(name, ty)
    }

    #[test]
    fn empty_cell_is_unset() {
        let parsed = FieldValue::parse(def("spacing_mm", FieldType::Float2), "   ").unwrap();
        assert_eq!(parsed, None);
    }

    #[test]
    fn parses_scalar_cells() {
        assert_eq!(
            FieldValue::parse(def("spacing_mm", FieldType::Float2), "126.5").unwrap(),
            Some(FieldValue::Float(126.5))
        );
        assert_eq!(
            FieldValue::parse(def("toe_clips", FieldType::Bool), "Yes").unwrap(),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(
            FieldValue::parse(def("purchase_date", FieldType::Date), "2021-06-30").unwrap(),
            Some(FieldValue::Date(NaiveDate::from_ymd_opt(2021, 6, 30).unwrap()))
        );
    }

    #[test]
    fn parses_lists_in_json_and_comma_form() {
        let field = def("seat_tube_wall_thickness", FieldType::FloatList);
        let json = FieldValue::parse(field, "[0.9, 0.6, 0.9]").unwrap();
        let plain = FieldValue::parse(field, "0.9,0.6,0.9").unwrap();
        assert_eq!(json, Some(FieldValue::FloatList(vec![0.9, 0.6, 0.9])));
        assert_eq!(json, plain);
    }

    #[test]
    fn map_cell_must_be_json_object() {
        let field = def("stamped_codes", FieldType::Map);
        assert_eq!(
            FieldValue::parse(field, r#"{"code":"X1"}"#).unwrap(),
            Some(FieldValue::map([("code", "X1")]))
        );
        assert!(matches!(
            FieldValue::parse(field, "[1,2]"),
            Err(AttributeError::TypeMismatch { field: "stamped_codes", .. })
        ));
    }

    #[test]
    fn rejects_overlong_text_and_bad_year() {
        let long = FieldValue::parse(def("valve_type", FieldType::Text(10)), "presta-long-valve");
        assert!(matches!(long, Err(AttributeError::InvalidValue { .. })));

        let year = FieldValue::parse(def("model_year", FieldType::Year), "98");
        assert!(matches!(year, Err(AttributeError::InvalidValue { .. })));
    }

    #[test]
    fn rejects_negative_measurements() {
        let result = FieldValue::parse(def("spacing_mm", FieldType::Float2), "-1");
        assert!(matches!(result, Err(AttributeError::InvalidValue { .. })));
    }

    #[test]
    fn validate_rejects_unknown_and_key_fields() {
        let fork = EntityKind::Component(ComponentKind::Fork);

        let unknown = Attributes::new().with("spoke_qty", 32);
        assert!(matches!(
            unknown.validate(fork),
            Err(AttributeError::UnknownField { .. })
        ));

        let key = Attributes::new().with("manufacturer", "Acme");
        assert!(matches!(
            key.validate(fork),
            Err(AttributeError::UnknownField { .. })
        ));

        let ok = Attributes::new()
            .with("crown_type", "sloping")
            .with("steerer_length_mm", 180.0);
        ok.validate(fork).unwrap();
    }

    #[test]
    fn validate_rejects_type_mismatch() {
        let attributes = Attributes::new().with("steerer_length_mm", "long");
        let error = attributes
            .validate(EntityKind::Component(ComponentKind::Fork))
            .unwrap_err();
        assert!(matches!(
            error,
            AttributeError::TypeMismatch {
                field: "steerer_length_mm",
                expected: FieldType::Float2
            }
        ));
    }
}
