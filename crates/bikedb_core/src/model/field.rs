//! Semantic field types and the declaration record used by the registry.
//!
//! # Responsibility
//! - Name every storage shape an entity attribute can take.
//! - Map each shape to its SQLite column declaration.
//!
//! # Invariants
//! - `Text` lengths are counted in characters, not bytes.
//! - Map and list values are persisted as JSON text.

use serde::Serialize;

/// Semantic type of one declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Short string with a maximum character count (10, 20 or 40).
    Text(usize),
    /// Floating point value shown with two decimals.
    Float2,
    /// Four digit calendar year.
    Year,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    Bool,
    /// Integer count, e.g. spoke or tooth quantity.
    Count,
    /// Free-form key/value map.
    Map,
    IntList,
    FloatList,
    TextList,
}

impl FieldType {
    /// Returns the SQLite column declaration for a column named `name`.
    pub fn sql_type(self, name: &str) -> String {
        match self {
            Self::Text(max) => format!("TEXT CHECK (length({name}) <= {max})"),
            Self::Float2 => "REAL".to_string(),
            Self::Year | Self::Bool | Self::Count => "INTEGER".to_string(),
            Self::Date | Self::Map | Self::IntList | Self::FloatList | Self::TextList => {
                "TEXT".to_string()
            }
        }
    }

    /// Returns whether negative values are physically meaningless.
    pub fn is_non_negative(self) -> bool {
        matches!(self, Self::Float2 | Self::Count | Self::FloatList | Self::IntList)
    }

    /// Short label used in error messages.
    pub fn label(self) -> String {
        match self {
            Self::Text(max) => format!("text({max})"),
            Self::Float2 => "float".to_string(),
            Self::Year => "year".to_string(),
            Self::Date => "date".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Count => "count".to_string(),
            Self::Map => "map".to_string(),
            Self::IntList => "int list".to_string(),
            Self::FloatList => "float list".to_string(),
            Self::TextList => "text list".to_string(),
        }
    }
}

/// One declared attribute: column name plus semantic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldDef {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

pub(crate) const TEXT_10: FieldType = FieldType::Text(10);
pub(crate) const TEXT_20: FieldType = FieldType::Text(20);
pub(crate) const TEXT_40: FieldType = FieldType::Text(40);

#[cfg(test)]
mod tests {
    use super::{FieldType, TEXT_20};

    #[test]
    fn text_column_carries_length_check() {
        assert_eq!(
            TEXT_20.sql_type("brand"),
            "TEXT CHECK (length(brand) <= 20)"
        );
    }

    #[test]
    fn structured_types_are_stored_as_text() {
        assert_eq!(FieldType::Map.sql_type("features"), "TEXT");
        assert_eq!(FieldType::FloatList.sql_type("wall"), "TEXT");
        assert_eq!(FieldType::Date.sql_type("purchase_date"), "TEXT");
    }

    #[test]
    fn only_measurements_are_non_negative() {
        assert!(FieldType::Float2.is_non_negative());
        assert!(FieldType::Count.is_non_negative());
        assert!(!FieldType::Year.is_non_negative());
        assert!(!TEXT_20.is_non_negative());
    }
}
