//! Lenient readers over raw backend JSON. Absent or mistyped optional
//! fields read as their documented default (empty string, empty list, zero,
//! `false`); only the overall shape of a response can fail.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub type Doc = Map<String, Value>;

pub fn object<'a>(value: &'a Value, what: &str) -> Result<&'a Doc> {
    value
        .as_object()
        .ok_or_else(|| {
            Error::InvalidResponse(format!("Expected {} to be an object, got {}", what, kind(value)))
        })
}

/// Array items; `null` reads as an empty list.
pub fn array<'a>(value: &'a Value, what: &str) -> Result<&'a [Value]> {
    match value {
        Value::Array(items) => Ok(items.as_slice()),
        Value::Null => Ok(&[][..]),
        other => Err(Error::InvalidResponse(format!(
            "Expected {} to be an array, got {}",
            what,
            kind(other)
        ))),
    }
}

pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn string(doc: &Doc, key: &str) -> String {
    opt_string(doc, key).unwrap_or_default()
}

/// Non-empty string value. Numbers are accepted and rendered.
pub fn opt_string(doc: &Doc, key: &str) -> Option<String> {
    match doc.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First key holding a non-empty string.
pub fn first_string(doc: &Doc, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| opt_string(doc, key))
}

pub fn string_list(doc: &Doc, key: &str) -> Vec<String> {
    match doc.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Object(inner) => first_string(inner, &["name", "value", "slug", "title"]),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Numeric value; numeric strings are accepted, anything else is zero.
pub fn number(doc: &Doc, key: &str) -> f64 {
    match doc.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn integer(doc: &Doc, key: &str) -> i64 {
    match doc.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub fn unsigned(doc: &Doc, key: &str) -> u32 {
    u32::try_from(integer(doc, key).max(0)).unwrap_or(u32::MAX)
}

pub fn boolean(doc: &Doc, key: &str) -> bool {
    match doc.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1" | "yes"),
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// RFC 3339 timestamp or bare `YYYY-MM-DD` date.
pub fn timestamp(doc: &Doc, key: &str) -> Option<DateTime<Utc>> {
    let raw = doc.get(key)?.as_str()?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Timestamp or the Unix epoch when absent.
pub fn timestamp_or_epoch(doc: &Doc, key: &str) -> DateTime<Utc> {
    timestamp(doc, key).unwrap_or_default()
}

/// Month as 1-12, from a number or an English/French month name.
pub fn month(doc: &Doc, key: &str) -> u32 {
    match doc.get(key) {
        Some(Value::String(s)) if s.trim().parse::<u32>().is_err() => month_from_name(s),
        _ => Some(unsigned(doc, key))
            .filter(|m| (1..=12).contains(m))
            .unwrap_or(0),
    }
}

fn month_from_name(name: &str) -> u32 {
    const MONTHS: [&[&str]; 12] = [
        &["jan", "janv"],
        &["feb", "fev", "fév"],
        &["mar", "mars"],
        &["apr", "avr"],
        &["may", "mai"],
        &["jun", "juin"],
        &["jul", "juil"],
        &["aug", "aou", "aoû"],
        &["sep", "sept"],
        &["oct"],
        &["nov"],
        &["dec", "déc"],
    ];

    let lower = name.trim().to_lowercase();
    MONTHS
        .iter()
        .position(|prefixes| prefixes.iter().any(|prefix| lower.starts_with(prefix)))
        .map(|index| index as u32 + 1)
        .unwrap_or(0)
}

/// Object entries of an optional array member.
pub fn objects<'a>(doc: &'a Doc, key: &str) -> Result<impl Iterator<Item = &'a Doc>> {
    let items = match doc.get(key) {
        Some(value) => array(value, key)?,
        None => &[][..],
    };
    Ok(items.iter().filter_map(Value::as_object))
}

/// Parse each entry of a closed vocabulary, dropping unknown terms and
/// duplicates while keeping first-seen order.
pub fn vocabulary<T>(doc: &Doc, key: &str, parse: fn(&str) -> Option<T>) -> Vec<T>
where
    T: PartialEq,
{
    let mut values = Vec::new();
    for entry in string_list(doc, key) {
        match parse(&entry) {
            Some(value) if !values.contains(&value) => values.push(value),
            Some(_) => {}
            None => debug!("Dropping unknown {} entry: {}", key, entry),
        }
    }
    values
}

/// Drop one bad record from a list instead of failing the whole list.
pub fn skip_invalid<T>(result: Result<T>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Skipping {}: {}", what, err);
            None
        }
    }
}
