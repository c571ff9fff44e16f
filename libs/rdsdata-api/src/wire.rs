use std::fmt;

use base64::Engine;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

use crate::convert::FromWire;
use crate::error::MappingError;

/// One scalar value as exchanged with the data service.
///
/// Closed union: exactly one variant is present. Payloads that populate
/// several members at once are rejected on deserialization instead of
/// being guessed at; an `isNull: true` marker wins over any other member.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawField")]
pub enum WireField {
    Null,
    Integer(i64),
    FloatingPoint(f64),
    Text(String),
    Boolean(bool),
    Blob(Vec<u8>),
}

impl WireField {
    pub fn is_null(&self) -> bool {
        matches!(self, WireField::Null)
    }

    /// Wire member name, as used in the service's JSON shape.
    pub fn kind(&self) -> &'static str {
        match self {
            WireField::Null => "isNull",
            WireField::Integer(_) => "longValue",
            WireField::FloatingPoint(_) => "doubleValue",
            WireField::Text(_) => "stringValue",
            WireField::Boolean(_) => "booleanValue",
            WireField::Blob(_) => "blobValue",
        }
    }
}

impl fmt::Display for WireField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireField::Null => write!(f, "{{isNull: true}}"),
            WireField::Integer(v) => write!(f, "{{longValue: {v}}}"),
            WireField::FloatingPoint(v) => write!(f, "{{doubleValue: {v}}}"),
            WireField::Text(v) => write!(f, "{{stringValue: {v}}}"),
            WireField::Boolean(v) => write!(f, "{{booleanValue: {v}}}"),
            WireField::Blob(v) => write!(f, "{{blobValue: {} bytes}}", v.len()),
        }
    }
}

impl Serialize for WireField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            WireField::Null => map.serialize_entry("isNull", &true)?,
            WireField::Integer(v) => map.serialize_entry("longValue", v)?,
            WireField::FloatingPoint(v) => map.serialize_entry("doubleValue", v)?,
            WireField::Text(v) => map.serialize_entry("stringValue", v)?,
            WireField::Boolean(v) => map.serialize_entry("booleanValue", v)?,
            WireField::Blob(v) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(v);
                map.serialize_entry("blobValue", &encoded)?
            }
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    is_null: Option<bool>,
    long_value: Option<i64>,
    double_value: Option<f64>,
    string_value: Option<String>,
    boolean_value: Option<bool>,
    blob_value: Option<String>,
}

impl TryFrom<RawField> for WireField {
    type Error = String;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        if raw.is_null == Some(true) {
            return Ok(WireField::Null);
        }

        let mut present = Vec::with_capacity(1);
        if let Some(v) = raw.long_value {
            present.push(WireField::Integer(v));
        }
        if let Some(v) = raw.double_value {
            present.push(WireField::FloatingPoint(v));
        }
        if let Some(v) = raw.string_value {
            present.push(WireField::Text(v));
        }
        if let Some(v) = raw.boolean_value {
            present.push(WireField::Boolean(v));
        }
        if let Some(v) = raw.blob_value {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(v)
                .map_err(|e| format!("blobValue is not valid base64: {e}"))?;
            present.push(WireField::Blob(bytes));
        }

        match present.len() {
            1 => Ok(present.remove(0)),
            0 => Err("wire field has no value".to_string()),
            n => Err(format!("wire field has {n} values, expected exactly one")),
        }
    }
}

/// Tells the service how to reinterpret a `Text` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeHint {
    Decimal,
    Date,
    Time,
    Timestamp,
    Uuid,
}

impl TypeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeHint::Decimal => "DECIMAL",
            TypeHint::Date => "DATE",
            TypeHint::Time => "TIME",
            TypeHint::Timestamp => "TIMESTAMP",
            TypeHint::Uuid => "UUID",
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded form of one native value: the field plus its optional hint.
#[derive(Debug, Clone, PartialEq)]
pub struct WireValue {
    pub field: WireField,
    pub type_hint: Option<TypeHint>,
}

impl WireValue {
    pub fn plain(field: WireField) -> Self {
        Self { field, type_hint: None }
    }

    pub fn hinted(field: WireField, hint: TypeHint) -> Self {
        Self {
            field,
            type_hint: Some(hint),
        }
    }
}

/// Named parameter as sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlParameter {
    pub name: String,
    pub value: WireField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<TypeHint>,
}

impl SqlParameter {
    pub fn new(name: impl Into<String>, value: WireValue) -> Self {
        Self {
            name: name.into(),
            value: value.field,
            type_hint: value.type_hint,
        }
    }
}

/// Result column description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Name used to correlate this column with a struct member.
    ///
    /// With `use_label` set the label wins; a column without a label
    /// falls back to its physical name.
    pub fn identity(&self, use_label: bool) -> &str {
        match (&self.label, use_label) {
            (Some(label), true) => label,
            _ => &self.name,
        }
    }
}

/// Positional row of wire fields. Order matches the result set's columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Vec<WireField>);

impl Row {
    pub fn new(fields: Vec<WireField>) -> Self {
        Self(fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WireField> {
        self.0.get(index)
    }

    /// Converts the field at `index`. A missing index reads as `Null`.
    pub fn value<T: FromWire>(&self, index: usize) -> Result<T, MappingError> {
        T::from_wire(self.0.get(index).unwrap_or(&WireField::Null))
    }
}

impl From<Vec<WireField>> for Row {
    fn from(fields: Vec<WireField>) -> Self {
        Self(fields)
    }
}
