//! Input coercion, following JavaScript's conversion rules.

use crate::value::Value;
use chrono::{DateTime, NaiveDate, Utc};

pub(crate) fn to_string(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        other => Value::String(other.to_js_string()),
    }
}

pub(crate) fn to_number(value: &Value) -> Value {
    let number = match value {
        Value::Number(n) => *n,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::BigInt(n) => *n as f64,
        Value::String(s) => parse_number(s),
        Value::Date(d) => d.timestamp_millis() as f64,
        Value::Array(_) => parse_number(&value.to_js_string()),
        _ => f64::NAN,
    };
    Value::Number(number)
}

/// Leaves the value unchanged when it has no integer reading, so the type
/// check reports it.
pub(crate) fn to_bigint(value: &Value) -> Value {
    let converted = match value {
        Value::BigInt(n) => Some(*n),
        Value::Bool(b) => Some(i128::from(*b)),
        Value::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i128),
        Value::String(s) if s.trim().is_empty() => Some(0),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    };
    converted.map_or_else(|| value.clone(), Value::BigInt)
}

pub(crate) fn to_boolean(value: &Value) -> Value {
    Value::Bool(value.is_truthy())
}

/// `None` when the value has no date reading.
pub(crate) fn to_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Null => DateTime::from_timestamp_millis(0),
        Value::Number(n) if n.is_finite() => DateTime::from_timestamp_millis(*n as i64),
        Value::String(s) => parse_date(s.trim()),
        _ => None,
    }
}

fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    match text {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => {
            if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                return i64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
            }
            let numeric = text
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
            if numeric {
                text.parse().unwrap_or(f64::NAN)
            } else {
                f64::NAN
            }
        }
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
