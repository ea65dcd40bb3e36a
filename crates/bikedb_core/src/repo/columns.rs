//! Conversion between attribute values and SQLite column values.

use crate::model::field::{FieldDef, FieldType};
use crate::model::value::FieldValue;
use chrono::NaiveDate;
use rusqlite::types::{Value, ValueRef};

/// Encodes one attribute value for binding.
pub(crate) fn to_sql_value(value: Option<&FieldValue>) -> Value {
    let Some(value) = value else {
        return Value::Null;
    };
    match value {
        FieldValue::Text(text) => Value::Text(text.clone()),
        FieldValue::Float(number) => Value::Real(*number),
        FieldValue::Int(number) => Value::Integer(*number),
        FieldValue::Date(date) => Value::Text(date.format("%Y-%m-%d").to_string()),
        FieldValue::Bool(flag) => Value::Integer(i64::from(*flag)),
        FieldValue::Map(map) => Value::Text(serde_json::Value::Object(map.clone()).to_string()),
        FieldValue::IntList(items) => Value::Text(serde_json::Value::from(items.clone()).to_string()),
        FieldValue::FloatList(items) => {
            Value::Text(serde_json::Value::from(items.clone()).to_string())
        }
        FieldValue::TextList(items) => {
            Value::Text(serde_json::Value::from(items.clone()).to_string())
        }
    }
}

/// Decodes one stored column into an attribute value.
///
/// Returns a human-readable reason when the stored value does not fit the
/// declared type.
pub(crate) fn from_sql_value(
    field: FieldDef,
    raw: ValueRef<'_>,
) -> Result<Option<FieldValue>, String> {
    if matches!(raw, ValueRef::Null) {
        return Ok(None);
    }
    let unexpected = || format!("unexpected {:?} for {}", raw.data_type(), field.ty.label());

    let value = match field.ty {
        FieldType::Text(_) => FieldValue::Text(read_text(raw).ok_or_else(unexpected)?),
        FieldType::Float2 => match raw {
            ValueRef::Real(number) => FieldValue::Float(number),
            ValueRef::Integer(number) => FieldValue::Float(number as f64),
            _ => return Err(unexpected()),
        },
        FieldType::Year | FieldType::Count => match raw {
            ValueRef::Integer(number) => FieldValue::Int(number),
            _ => return Err(unexpected()),
        },
        FieldType::Bool => match raw {
            ValueRef::Integer(0) => FieldValue::Bool(false),
            ValueRef::Integer(1) => FieldValue::Bool(true),
            _ => return Err(unexpected()),
        },
        FieldType::Date => {
            let text = read_text(raw).ok_or_else(unexpected)?;
            let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map_err(|err| format!("invalid date `{text}`: {err}"))?;
            FieldValue::Date(date)
        }
        FieldType::Map => match parse_json(raw)? {
            serde_json::Value::Object(map) => FieldValue::Map(map),
            _ => return Err(unexpected()),
        },
        FieldType::IntList => FieldValue::IntList(parse_json_as(raw)?),
        FieldType::FloatList => FieldValue::FloatList(parse_json_as(raw)?),
        FieldType::TextList => FieldValue::TextList(parse_json_as(raw)?),
    };
    Ok(Some(value))
}

fn read_text(raw: ValueRef<'_>) -> Option<String> {
    match raw {
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec()).ok(),
        _ => None,
    }
}

fn parse_json(raw: ValueRef<'_>) -> Result<serde_json::Value, String> {
    let text = read_text(raw).ok_or_else(|| "expected JSON text".to_string())?;
    serde_json::from_str(&text).map_err(|err| format!("invalid JSON `{text}`: {err}"))
}

fn parse_json_as<T: serde::de::DeserializeOwned>(raw: ValueRef<'_>) -> Result<T, String> {
    serde_json::from_value(parse_json(raw)?).map_err(|err| err.to_string())
}
