//! Content-derived record identity.
//!
//! # Responsibility
//! - Derive a stable identifier for a record from its purchase identity:
//!   production year, manufacturer, model name and purchase date.
//!
//! # Invariants
//! - Derivation is a pure function: same inputs, same digest, every process.
//! - Field order is fixed and every field is length-prefixed, so shifting
//!   characters between adjacent fields always changes the digest.
//! - Output is 64 lowercase hex characters (SHA-256).

use crate::model::record::{Component, Frame};
use crate::model::value::Attributes;
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

const FIELD_SEPARATOR: &str = "|";

/// Hex-encoded digest identifying one physical part.
pub type RecordId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// A digest input was unset when derivation was requested.
    MissingAttribute(&'static str),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAttribute(name) => {
                write!(f, "cannot derive identity: `{name}` is not set")
            }
        }
    }
}

impl Error for IdentityError {}

/// The four attribute values a record identity is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityFields {
    pub production_year: i64,
    pub manufacturer: String,
    pub model_name: String,
    pub purchase_date: NaiveDate,
}

impl IdentityFields {
    /// Collects identity inputs from a record's attribute set.
    ///
    /// `manufacturer` and `model_name` may be supplied separately because
    /// component records keep them in their composite key rather than in
    /// `Attributes`.
    ///
    /// # Errors
    /// - `MissingAttribute` naming the first unset input, in digest order.
    pub fn collect(
        attributes: &Attributes,
        manufacturer: Option<&str>,
        model_name: Option<&str>,
    ) -> Result<Self, IdentityError> {
        let production_year = attributes
            .get("production_year")
            .and_then(|value| value.as_int())
            .ok_or(IdentityError::MissingAttribute("production_year"))?;
        let manufacturer = manufacturer
            .or_else(|| attributes.get("manufacturer").and_then(|v| v.as_text()))
            .filter(|value| !value.trim().is_empty())
            .ok_or(IdentityError::MissingAttribute("manufacturer"))?;
        let model_name = model_name
            .or_else(|| attributes.get("model_name").and_then(|v| v.as_text()))
            .filter(|value| !value.trim().is_empty())
            .ok_or(IdentityError::MissingAttribute("model_name"))?;
        let purchase_date = attributes
            .get("purchase_date")
            .and_then(|value| value.as_date())
            .ok_or(IdentityError::MissingAttribute("purchase_date"))?;

        Ok(Self {
            production_year,
            manufacturer: manufacturer.to_string(),
            model_name: model_name.to_string(),
            purchase_date,
        })
    }

    /// Collects identity inputs from a flat attribute set.
    pub fn from_attributes(attributes: &Attributes) -> Result<Self, IdentityError> {
        Self::collect(attributes, None, None)
    }

    fn canonical_form(&self) -> String {
        let parts = [
            self.production_year.to_string(),
            self.manufacturer.clone(),
            self.model_name.clone(),
            self.purchase_date.format("%Y-%m-%d").to_string(),
        ];
        parts
            .iter()
            .map(|part| format!("{}:{part}", part.len()))
            .collect::<Vec<_>>()
            .join(FIELD_SEPARATOR)
    }
}

/// Derives the record identity digest.
pub fn derive_identity(fields: &IdentityFields) -> RecordId {
    let mut hasher = Sha256::new();
    hasher.update(fields.canonical_form().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Derives the identity of a frame from its attributes.
pub fn frame_identity(frame: &Frame) -> Result<RecordId, IdentityError> {
    let fields = IdentityFields::from_attributes(&frame.attributes)?;
    Ok(derive_identity(&fields))
}

/// Derives the identity of a component; manufacturer and model come from its key.
pub fn component_identity(component: &Component) -> Result<RecordId, IdentityError> {
    let fields = IdentityFields::collect(
        &component.attributes,
        Some(component.key.manufacturer.as_str()),
        Some(component.key.model_name.as_str()),
    )?;
    Ok(derive_identity(&fields))
}
