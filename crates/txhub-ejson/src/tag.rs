//! Recognized Extended JSON wrapper tags

use serde_json::{Map, Number, Value};
use std::fmt;

/// Closed set of wrapper tags the normalizer understands, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtendedTag {
    /// `$oid`
    ObjectId,
    /// `$date`
    Date,
    /// `$numberLong`
    NumberLong,
    /// `$numberInt`
    NumberInt,
    /// `$numberDouble`
    NumberDouble,
    /// `$binary`
    Binary,
    /// `$regex`
    Regex,
    /// `$timestamp`
    Timestamp,
    /// `$undefined`
    Undefined,
    /// `$minKey`
    MinKey,
    /// `$maxKey`
    MaxKey,
    /// `$ref` + `$id`
    DbRef,
}

impl ExtendedTag {
    /// All tags in recognition order
    pub const ALL: [Self; 12] = [
        Self::ObjectId,
        Self::Date,
        Self::NumberLong,
        Self::NumberInt,
        Self::NumberDouble,
        Self::Binary,
        Self::Regex,
        Self::Timestamp,
        Self::Undefined,
        Self::MinKey,
        Self::MaxKey,
        Self::DbRef,
    ];

    /// Wrapper key as it appears in Extended JSON
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ObjectId => "$oid",
            Self::Date => "$date",
            Self::NumberLong => "$numberLong",
            Self::NumberInt => "$numberInt",
            Self::NumberDouble => "$numberDouble",
            Self::Binary => "$binary",
            Self::Regex => "$regex",
            Self::Timestamp => "$timestamp",
            Self::Undefined => "$undefined",
            Self::MinKey => "$minKey",
            Self::MaxKey => "$maxKey",
            Self::DbRef => "$ref",
        }
    }
}

impl fmt::Display for ExtendedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A wrapper object whose shape matched one of the tags
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Wrapper<'a> {
    ObjectId(&'a str),
    Date(&'a str),
    DateMillis(&'a Number),
    NumberLong(&'a str),
    NumberInt(&'a Number),
    NumberDouble(&'a str),
    Binary(&'a str),
    Regex(&'a str),
    Timestamp(&'a str),
    Undefined,
    MinKey,
    MaxKey,
    DbRef { reference: &'a str, id: &'a str },
}

impl Wrapper<'_> {
    pub(crate) fn tag(&self) -> ExtendedTag {
        match self {
            Self::ObjectId(_) => ExtendedTag::ObjectId,
            Self::Date(_) | Self::DateMillis(_) => ExtendedTag::Date,
            Self::NumberLong(_) => ExtendedTag::NumberLong,
            Self::NumberInt(_) => ExtendedTag::NumberInt,
            Self::NumberDouble(_) => ExtendedTag::NumberDouble,
            Self::Binary(_) => ExtendedTag::Binary,
            Self::Regex(_) => ExtendedTag::Regex,
            Self::Timestamp(_) => ExtendedTag::Timestamp,
            Self::Undefined => ExtendedTag::Undefined,
            Self::MinKey => ExtendedTag::MinKey,
            Self::MaxKey => ExtendedTag::MaxKey,
            Self::DbRef { .. } => ExtendedTag::DbRef,
        }
    }
}

/// Match an object against the wrapper shapes.
///
/// Only exact shapes count: one tag key with the expected payload type, or
/// `$ref` + `$id` strings with an optional `$db`. Anything else is data.
/// A numeric `$date` is epoch milliseconds.
pub(crate) fn recognize(map: &Map<String, Value>) -> Option<Wrapper<'_>> {
    if map.len() == 1 {
        let (key, value) = map.iter().next()?;
        return match (key.as_str(), value) {
            ("$oid", Value::String(s)) => Some(Wrapper::ObjectId(s)),
            ("$date", Value::String(s)) => Some(Wrapper::Date(s)),
            ("$date", Value::Number(n)) => Some(Wrapper::DateMillis(n)),
            ("$numberLong", Value::String(s)) => Some(Wrapper::NumberLong(s)),
            ("$numberInt", Value::Number(n)) => Some(Wrapper::NumberInt(n)),
            ("$numberDouble", Value::String(s)) => Some(Wrapper::NumberDouble(s)),
            ("$binary", Value::String(s)) => Some(Wrapper::Binary(s)),
            ("$regex", Value::String(s)) => Some(Wrapper::Regex(s)),
            ("$timestamp", Value::String(s)) => Some(Wrapper::Timestamp(s)),
            ("$undefined", _) => Some(Wrapper::Undefined),
            ("$minKey", _) => Some(Wrapper::MinKey),
            ("$maxKey", _) => Some(Wrapper::MaxKey),
            _ => None,
        };
    }

    let extra_ok = match map.len() {
        2 => true,
        3 => matches!(map.get("$db"), Some(Value::String(_))),
        _ => false,
    };
    if !extra_ok {
        return None;
    }
    match (map.get("$ref"), map.get("$id")) {
        (Some(Value::String(reference)), Some(Value::String(id))) => {
            Some(Wrapper::DbRef { reference, id })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: &Value) -> &Map<String, Value> {
        value.as_object().unwrap()
    }

    #[test]
    fn recognizes_single_key_wrappers() {
        let v = json!({"$oid": "abc"});
        assert_eq!(recognize(object(&v)), Some(Wrapper::ObjectId("abc")));

        let v = json!({"$undefined": true});
        assert_eq!(recognize(object(&v)), Some(Wrapper::Undefined));

        let v = json!({"$minKey": 1});
        assert_eq!(recognize(object(&v)).map(|w| w.tag()), Some(ExtendedTag::MinKey));
    }

    #[test]
    fn rejects_wrong_payload_type() {
        assert_eq!(recognize(object(&json!({"$oid": 42}))), None);
        assert_eq!(recognize(object(&json!({"$numberInt": "5"}))), None);
        assert_eq!(recognize(object(&json!({"$date": {"$numberLong": "0"}}))), None);
        let v = json!({"$date": 0});
        assert_eq!(recognize(object(&v)).map(|w| w.tag()), Some(ExtendedTag::Date));
    }

    #[test]
    fn rejects_extra_keys() {
        assert_eq!(recognize(object(&json!({"$oid": "abc", "x": 1}))), None);
        assert_eq!(
            recognize(object(&json!({"$ref": "a", "$id": "b", "other": "c"}))),
            None
        );
    }

    #[test]
    fn recognizes_db_ref_with_optional_db() {
        let v = json!({"$ref": "users", "$id": "abc"});
        assert_eq!(
            recognize(object(&v)),
            Some(Wrapper::DbRef { reference: "users", id: "abc" })
        );

        let v = json!({"$ref": "users", "$id": "abc", "$db": "shop"});
        assert!(matches!(recognize(object(&v)), Some(Wrapper::DbRef { .. })));

        assert_eq!(recognize(object(&json!({"$ref": "users"}))), None);
    }

    #[test]
    fn tag_keys() {
        assert_eq!(ExtendedTag::NumberLong.to_string(), "$numberLong");
        assert_eq!(ExtendedTag::ALL.len(), 12);
    }
}
