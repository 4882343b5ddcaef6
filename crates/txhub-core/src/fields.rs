//! Flat field editing
//!
//! The top-level scalar members of a record (text, numbers, booleans) are
//! editable one by one; everything else in the record is carried through
//! untouched when an edit is written back.

use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::fmt;

/// An editable scalar
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(Number),
    Flag(bool),
}

impl FieldValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::Bool(b) => Some(Self::Flag(*b)),
            _ => None,
        }
    }

    /// Parse operator input as a value of the same kind as `self`.
    ///
    /// # Errors
    /// A reason string when `input` does not fit the field's kind.
    pub fn coerce(&self, input: &str) -> Result<FieldValue, String> {
        match self {
            Self::Text(_) => Ok(Self::Text(input.to_string())),
            Self::Number(_) => parse_number(input.trim())
                .map(Self::Number)
                .ok_or_else(|| format!("{input:?} is not a number")),
            Self::Flag(_) => match input.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Self::Flag(true)),
                "false" | "0" | "no" | "off" => Ok(Self::Flag(false)),
                _ => Err(format!("{input:?} is not a boolean")),
            },
        }
    }

    /// Input control a form would render for this value
    #[must_use]
    pub fn input_kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Flag(_) => "checkbox",
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Flag(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::from(i));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Editable scalar members of one record, in record order
pub type FlatFields = IndexMap<String, FieldValue>;

/// Collect the scalar members of a record; non-objects have none
#[must_use]
pub fn extract_flat_fields(record: &Value) -> FlatFields {
    match record {
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| FieldValue::from_json(v).map(|f| (k.clone(), f)))
            .collect(),
        _ => FlatFields::new(),
    }
}

/// Write one edited scalar back into `record`.
///
/// # Errors
/// A reason string when the member is missing, not a scalar, or the input
/// does not fit its kind.
pub fn apply_flat_edit(record: &mut Value, key: &str, input: &str) -> Result<FieldValue, String> {
    let Value::Object(map) = record else {
        return Err("record is not an object".to_string());
    };
    let current = map
        .get(key)
        .ok_or_else(|| "no such field".to_string())?;
    let current = FieldValue::from_json(current)
        .ok_or_else(|| "only text, number and boolean fields are editable".to_string())?;
    let updated = current.coerce(input)?;
    map.insert(key.to_string(), updated.to_json());
    Ok(updated)
}
