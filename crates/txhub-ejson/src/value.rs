//! Normalized value tree
//!
//! Plain JSON plus the three values JSON cannot spell: an explicit
//! `undefined` marker and the two infinity sentinels produced by
//! `$minKey`/`$maxKey`.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Number, Value};

/// Output of normalization
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    /// JSON null
    Null,
    /// Explicitly undefined, distinct from null
    Undefined,
    /// Boolean
    Bool(bool),
    /// Number
    Number(Number),
    /// Text
    String(String),
    /// Sequence
    Array(Vec<NormalizedValue>),
    /// Keyed mapping, insertion ordered
    Object(IndexMap<String, NormalizedValue>),
    /// Sentinel below every other value (`$minKey`)
    NegativeInfinity,
    /// Sentinel above every other value (`$maxKey`)
    PositiveInfinity,
}

impl NormalizedValue {
    /// Empty mapping
    #[inline]
    #[must_use]
    pub fn empty_object() -> Self {
        Self::Object(IndexMap::new())
    }

    /// Member lookup on mappings
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&NormalizedValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Text content, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is the undefined marker
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Render as plain JSON.
    ///
    /// Undefined members are dropped from mappings; undefined elements and
    /// the infinity sentinels become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null | Self::Undefined | Self::NegativeInfinity | Self::PositiveInfinity => {
                Value::Null
            }
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// Scalar rendering used for identifier comparison
    #[must_use]
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<Value> for NormalizedValue {
    /// Lift plain JSON without interpreting wrappers
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl Serialize for NormalizedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null | Self::Undefined | Self::NegativeInfinity | Self::PositiveInfinity => {
                serializer.serialize_unit()
            }
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(None)?;
                for (k, v) in map.iter().filter(|(_, v)| !v.is_undefined()) {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lift_plain_json() {
        let v = NormalizedValue::from(json!({"a": [1, "x", null], "b": true}));
        assert_eq!(v.get("b"), Some(&NormalizedValue::Bool(true)));
        assert_eq!(v.to_json(), json!({"a": [1, "x", null], "b": true}));
    }

    #[test]
    fn undefined_members_are_dropped() {
        let mut map = IndexMap::new();
        map.insert("keep".to_string(), NormalizedValue::String("x".into()));
        map.insert("gone".to_string(), NormalizedValue::Undefined);
        map.insert(
            "list".to_string(),
            NormalizedValue::Array(vec![NormalizedValue::Undefined, NormalizedValue::PositiveInfinity]),
        );
        let v = NormalizedValue::Object(map);

        assert_eq!(v.to_json(), json!({"keep": "x", "list": [null, null]}));
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"keep":"x","list":[null,null]}"#
        );
    }

    #[test]
    fn key_order_is_preserved() {
        let v = NormalizedValue::from(json!({"z": 1, "a": 2, "m": 3}));
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn scalar_text_rendering() {
        assert_eq!(NormalizedValue::from(json!("T1")).scalar_text().as_deref(), Some("T1"));
        assert_eq!(NormalizedValue::from(json!(42)).scalar_text().as_deref(), Some("42"));
        assert_eq!(NormalizedValue::Null.scalar_text(), None);
    }
}
