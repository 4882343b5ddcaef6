//! Extended JSON normalization
//!
//! Walks a parsed JSON tree and replaces every recognized wrapper object
//! with its native equivalent. Unrecognized objects are normalized member by
//! member with their keys and order unchanged, then matched once more, since
//! normalized members can complete a wrapper (`{"$date": {"$numberLong": ..}}`).

use crate::error::{ParseError, ParseResult};
use crate::tag::{recognize, Wrapper};
use crate::value::NormalizedValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use std::fmt;

/// Location of a node inside the tree being normalized
#[derive(Debug, Clone, Copy)]
enum Path<'a> {
    Root,
    Key(&'a Path<'a>, &'a str),
    Index(&'a Path<'a>, usize),
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("$"),
            Self::Key(parent, key) => write!(f, "{parent}.{key}"),
            Self::Index(parent, index) => write!(f, "{parent}[{index}]"),
        }
    }
}

/// Normalize an Extended JSON tree
///
/// # Errors
/// Returns [`ParseError::InvalidExtendedValue`] when a recognized wrapper
/// carries a payload that does not convert (unparseable date, non-integer
/// `$numberLong`, ...).
pub fn normalize(value: &Value) -> ParseResult<NormalizedValue> {
    normalize_at(value, Path::Root)
}

fn normalize_at(value: &Value, path: Path<'_>) -> ParseResult<NormalizedValue> {
    match value {
        Value::Object(map) => {
            if let Some(wrapper) = recognize(map) {
                return convert(wrapper, path);
            }
            let mut out = IndexMap::with_capacity(map.len());
            for (key, member) in map {
                let normalized = normalize_at(member, Path::Key(&path, key))?;
                out.insert(key.clone(), normalized);
            }
            if let Some(scalars) = wrapper_candidate(&out) {
                if let Some(wrapper) = recognize(&scalars) {
                    return convert(wrapper, path);
                }
            }
            Ok(NormalizedValue::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| normalize_at(item, Path::Index(&path, i)))
            .collect::<ParseResult<Vec<_>>>()
            .map(NormalizedValue::Array),
        scalar => Ok(NormalizedValue::from(scalar.clone())),
    }
}

/// Members of an object that may form a wrapper only once its children are
/// normalized, e.g. `{"$ref": "users", "$id": {"$oid": "65a0"}}`.
///
/// Undefined members are skipped since they serialize away. Any other
/// non-scalar member rules the object out.
fn wrapper_candidate(members: &IndexMap<String, NormalizedValue>) -> Option<Map<String, Value>> {
    if !members.keys().any(|key| key.starts_with('$')) {
        return None;
    }
    members
        .iter()
        .filter(|(_, member)| !member.is_undefined())
        .map(|(key, member)| match member {
            NormalizedValue::String(s) => Some((key.clone(), Value::String(s.clone()))),
            NormalizedValue::Number(n) => Some((key.clone(), Value::Number(n.clone()))),
            _ => None,
        })
        .collect()
}

fn convert(wrapper: Wrapper<'_>, path: Path<'_>) -> ParseResult<NormalizedValue> {
    let invalid = |value: &str, reason: &str| {
        ParseError::invalid_value(wrapper.tag(), path.to_string(), value, reason)
    };

    let converted = match wrapper {
        Wrapper::ObjectId(s) | Wrapper::Binary(s) | Wrapper::Regex(s) => {
            NormalizedValue::String(s.to_string())
        }
        Wrapper::Date(s) => {
            let parsed = parse_date(s).ok_or_else(|| invalid(s, "not a recognized timestamp"))?;
            NormalizedValue::String(format_timestamp(&parsed))
        }
        Wrapper::DateMillis(n) => {
            let text = n.to_string();
            let parsed = n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .ok_or_else(|| invalid(&text, "not epoch milliseconds"))?;
            NormalizedValue::String(format_timestamp(&parsed))
        }
        Wrapper::NumberLong(s) => {
            let n: i64 = s
                .trim()
                .parse()
                .map_err(|_| invalid(s, "not a 64-bit integer"))?;
            NormalizedValue::Number(Number::from(n))
        }
        Wrapper::NumberInt(n) => NormalizedValue::Number(n.clone()),
        Wrapper::NumberDouble(s) => parse_double(s).ok_or_else(|| invalid(s, "not a number"))?,
        Wrapper::Timestamp(s) => {
            let seconds = leading_integer(s).ok_or_else(|| invalid(s, "no epoch seconds"))?;
            let parsed = DateTime::<Utc>::from_timestamp(seconds, 0)
                .ok_or_else(|| invalid(s, "epoch out of range"))?;
            NormalizedValue::String(format_timestamp(&parsed))
        }
        Wrapper::Undefined => NormalizedValue::Undefined,
        Wrapper::MinKey => NormalizedValue::NegativeInfinity,
        Wrapper::MaxKey => NormalizedValue::PositiveInfinity,
        Wrapper::DbRef { reference, id } => {
            let mut map = IndexMap::with_capacity(2);
            map.insert("ref".to_string(), NormalizedValue::String(reference.to_string()));
            map.insert("id".to_string(), NormalizedValue::String(id.to_string()));
            NormalizedValue::Object(map)
        }
    };
    Ok(converted)
}

/// Accepts RFC 3339, offset-less date-times (read as UTC) and bare dates.
fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_double(text: &str) -> Option<NormalizedValue> {
    let text = text.trim();
    match text {
        "Infinity" | "+Infinity" => return Some(NormalizedValue::PositiveInfinity),
        "-Infinity" => return Some(NormalizedValue::NegativeInfinity),
        "NaN" => return Some(NormalizedValue::Null),
        _ => {}
    }
    let f: f64 = text.parse().ok()?;
    Number::from_f64(f).map(NormalizedValue::Number)
}

/// Integer prefix of `text`, e.g. `1700000000` from `"1700000000, 1"`.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(text.len(), |(i, _)| i);
    text[..end].parse().ok()
}
