//! Conversions from loosely typed values into the shapes functions operate on.
//!
//! Every helper returns `None` rather than failing so that argument type tests can stay
//! non-throwing; callers decide whether a failed conversion is an error.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::Value;

/// Date-time layouts carrying an explicit UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Date-time layouts without an offset; these are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Converts any value to text.
///
/// `Null` becomes the empty string and arrays are flattened into a comma-joined list.
pub fn ensure_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Interprets a value as a number.
///
/// Numbers pass through and text is accepted when it holds a finite decimal. Booleans, dates
/// and containers are rejected. `Null` is handled by the argument type, not here.
pub fn ensure_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => Some(*number),
        Value::String(text) => parse_decimal(text),
        _ => None,
    }
}

fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let is_decimal_shape = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !is_decimal_shape {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Converts any value to a number the loose way editors expect from typed-in data.
///
/// Unlike [`ensure_numeric`] this never rejects a value: blank text and `Null` are `0`,
/// booleans are `0`/`1`, dates are epoch milliseconds and anything else unreadable is NaN.
pub fn loose_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Number(number) => *number,
        Value::Boolean(flag) => f64::from(u8::from(*flag)),
        Value::String(text) => text_to_number(text),
        Value::DateTime(datetime) => datetime.timestamp_millis() as f64,
        // A list reads as its comma-joined text, so only `[]` and single items convert
        Value::Array(_) => text_to_number(&value.to_string()),
        Value::Object(_) => f64::NAN,
    }
}

/// Reads text as a number, NaN when it is not one. Surrounding whitespace is ignored and
/// blank text is `0`.
pub fn text_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix)
            .map(|number| number as f64)
            .unwrap_or(f64::NAN);
    }

    let is_decimal_shape = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !is_decimal_shape {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Interprets a value as a date/time.
pub fn ensure_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::DateTime(datetime) => Some(*datetime),
        Value::String(text) => parse_datetime(text.trim()),
        _ => None,
    }
}

/// Parses the date and date-time layouts data providers hand out.
///
/// Strings without an offset are treated as UTC.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(datetime) = DateTime::parse_from_str(text, format) {
            return Some(datetime.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

/// Interprets a value as an object, accepting JSON object text.
pub fn ensure_object(value: &Value) -> Option<BTreeMap<String, Value>> {
    match value {
        Value::Object(entries) => Some(entries.clone()),
        Value::String(text) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(json @ serde_json::Value::Object(_)) => match Value::from(json) {
                Value::Object(entries) => Some(entries),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

/// Interprets a value as an array.
///
/// Text holding a JSON array is decoded; any other text is split on commas with each part
/// trimmed. Empty text and `Null` give an empty array, scalars a one-element array.
pub fn ensure_array(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::Null => Some(Vec::new()),
        Value::String(text) if text.trim().is_empty() => Some(Vec::new()),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('[') {
                if let Ok(json @ serde_json::Value::Array(_)) =
                    serde_json::from_str::<serde_json::Value>(trimmed)
                {
                    if let Value::Array(items) = Value::from(json) {
                        return Some(items);
                    }
                }
            }
            Some(
                text.split(',')
                    .map(|part| Value::String(part.trim().to_string()))
                    .collect(),
            )
        }
        Value::Number(_) | Value::Boolean(_) => Some(vec![value.clone()]),
        Value::DateTime(_) | Value::Object(_) => None,
    }
}

/// Interprets a value as a boolean.
///
/// The lenient form also accepts the text `true`/`false` in any case.
pub fn ensure_boolean(value: &Value, strict: bool) -> Option<bool> {
    match value {
        Value::Boolean(flag) => Some(*flag),
        Value::String(text) if !strict => {
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                Some(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}
