//! Tests for primitive schemas and their checks

use crate::checks::{Check, StringRule};
use crate::prelude::*;
use crate::{Bound, SizeOrigin, StringFormat, ValueType};
use chrono::{TimeZone, Utc};
use regex::Regex;
use serde_json::json;

fn codes(schema: &Schema, input: impl Into<Value>) -> Vec<&'static str> {
    schema
        .safe_parse(input)
        .map(|_| Vec::new())
        .unwrap_or_else(|e| e.codes())
}

// =============================================================================
// String
// =============================================================================

#[test]
fn test_string_accepts_strings_only() {
    let schema = string().into_schema();
    assert_eq!(schema.parse("hello").unwrap(), Value::from("hello"));

    let error = schema.safe_parse(json!(42)).unwrap_err();
    assert_eq!(error.len(), 1);
    assert_eq!(
        error.issues()[0].kind,
        IssueKind::InvalidType {
            expected: ValueType::String,
            received: ValueType::Number,
        }
    );
    assert_eq!(error.issues()[0].message, "Expected string, received number");
}

#[test]
fn test_missing_string_reads_required() {
    let error = string().into_schema().safe_parse(Value::Undefined).unwrap_err();
    assert_eq!(error.issues()[0].message, "Required");
}

#[test]
fn test_string_length_checks() {
    let schema = string().min(2).max(4).into_schema();
    assert!(schema.guard("abc"));
    assert_eq!(codes(&schema, "a"), vec!["too_small"]);
    assert_eq!(codes(&schema, "abcde"), vec!["too_big"]);

    let error = schema.safe_parse("a").unwrap_err();
    assert_eq!(
        error.issues()[0].message,
        "String must contain at least 2 character(s)"
    );
}

#[test]
fn test_string_length_counts_characters() {
    let schema = string().length(3).into_schema();
    assert!(schema.guard("日本語"));
    let error = schema.safe_parse("日本").unwrap_err();
    assert_eq!(
        error.issues()[0].message,
        "String must contain exactly 3 character(s)"
    );
}

#[test]
fn test_string_reports_every_failing_check() {
    let schema = string().min(10).email().starts_with("x").into_schema();
    assert_eq!(
        codes(&schema, "abc"),
        vec!["too_small", "invalid_string", "invalid_string"]
    );
}

#[test]
fn test_string_abort_early_stops_at_first_check() {
    let schema = string().min(10).email().with_abort_early(true).into_schema();
    assert_eq!(codes(&schema, "abc"), vec!["too_small"]);
}

#[test]
fn test_string_formats() {
    assert!(string().email().into_schema().guard("ada@example.com"));
    assert!(!string().email().into_schema().guard("ada@"));
    assert!(string().url().into_schema().guard("https://example.com/a?b=c"));
    assert!(!string().url().into_schema().guard("example.com"));
    assert!(string()
        .uuid()
        .into_schema()
        .guard("67e55044-10b1-426f-9247-bb680e5fe0c8"));
    assert!(string().cuid().into_schema().guard("cjld2cjxh0000qzrmn831i7rn"));
    assert!(string().ipv4().into_schema().guard("192.168.0.1"));
    assert!(!string().ipv4().into_schema().guard("::1"));
    assert!(string().datetime().into_schema().guard("2024-01-15T10:30:00Z"));
    assert!(!string().datetime().into_schema().guard("2024-01-15T10:30:00+01:00"));
    assert!(string()
        .datetime_with_offset()
        .into_schema()
        .guard("2024-01-15T10:30:00+01:00"));
}

#[test]
fn test_string_affixes_and_messages() {
    let schema = string().includes("@").ends_with(".com").into_schema();
    let error = schema.safe_parse("ada.org").unwrap_err();
    let messages: Vec<_> = error.issues().iter().map(|i| i.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Invalid input: must include \"@\"",
            "Invalid input: must end with \".com\"",
        ]
    );
}

#[test]
fn test_string_regex() {
    let schema = string().regex(Regex::new("^[a-z]+$").unwrap()).into_schema();
    assert!(schema.guard("abc"));
    let error = schema.safe_parse("ABC").unwrap_err();
    assert_eq!(
        error.issues()[0].kind,
        IssueKind::InvalidString {
            validation: StringFormat::Regex,
            detail: Some("^[a-z]+$".to_string()),
        }
    );
}

#[test]
fn test_string_pattern_rejects_bad_regex() {
    assert!(matches!(
        string().pattern("[unclosed"),
        Err(SchemaError::InvalidPattern(_))
    ));
    assert!(string().pattern("^\\d+$").is_ok());
}

#[test]
fn test_string_normalization_runs_before_checks() {
    let schema = string().trim().to_lower_case().min(2).into_schema();
    assert_eq!(schema.parse("  HeLLo ").unwrap(), Value::from("hello"));
    assert_eq!(codes(&schema, "  A  "), vec!["too_small"]);

    let upper = string().to_upper_case().into_schema();
    assert_eq!(upper.parse("abc").unwrap(), Value::from("ABC"));
}

#[test]
fn test_string_coercion() {
    let schema = string().coerce().into_schema();
    assert_eq!(schema.parse(json!(12)).unwrap(), Value::from("12"));
    assert_eq!(schema.parse(json!(true)).unwrap(), Value::from("true"));
    assert_eq!(schema.parse(json!(null)).unwrap(), Value::from("null"));
}

#[test]
fn test_check_message_override() {
    let schema = string()
        .add_check(Check::new(StringRule::Min(3)).with_message("too short"))
        .into_schema();
    let error = schema.safe_parse("a").unwrap_err();
    assert_eq!(error.issues()[0].message, "too short");
}

#[test]
fn test_check_management() {
    let schema = string().min(2).min(5).email();
    assert_eq!(schema.get_checks(&["min"]).len(), 1);
    assert!(schema.has_check("email"));

    let relaxed = schema.clone().disable_check("email");
    assert!(!relaxed.has_check("email"));
    assert!(relaxed.clone().into_schema().guard("abcdef"));
    assert!(!schema.clone().into_schema().guard("abcdef"));

    let restored = relaxed.enable_check("email");
    assert!(restored.has_check("email"));
}

#[test]
fn test_length_replaces_min_and_max() {
    let schema = string().min(1).max(10).length(3);
    assert!(!schema.has_check("min"));
    assert!(!schema.has_check("max"));
    assert_eq!(schema.min_length(), Some(3));
    assert_eq!(schema.max_length(), Some(3));
}

#[test]
fn test_builders_do_not_modify_receiver() {
    let base = string();
    let _stricter = base.clone().min(5);
    assert!(!base.has_check("min"));
    assert!(base.into_schema().guard(""));
}

// =============================================================================
// Number
// =============================================================================

#[test]
fn test_number_rejects_nan() {
    let error = number().into_schema().safe_parse(f64::NAN).unwrap_err();
    assert_eq!(
        error.issues()[0].kind,
        IssueKind::InvalidType {
            expected: ValueType::Number,
            received: ValueType::Nan,
        }
    );
}

#[test]
fn test_number_bounds() {
    let schema = number().gte(1.0).lt(10.0).into_schema();
    assert!(schema.guard(1));
    assert!(schema.guard(9.5));
    assert_eq!(codes(&schema, 0.5), vec!["too_small"]);
    assert_eq!(codes(&schema, 10), vec!["too_big"]);

    let error = schema.safe_parse(10).unwrap_err();
    assert_eq!(error.issues()[0].message, "Number must be less than 10");
}

#[test]
fn test_number_sign_helpers() {
    assert!(!number().positive().into_schema().guard(0));
    assert!(number().nonnegative().into_schema().guard(0));
    assert!(!number().negative().into_schema().guard(0));
    assert!(number().nonpositive().into_schema().guard(0));
}

#[test]
fn test_number_int() {
    let schema = number().int().into_schema();
    assert!(schema.guard(3));
    let error = schema.safe_parse(1.5).unwrap_err();
    assert_eq!(error.issues()[0].kind, IssueKind::NotInteger);
    assert_eq!(error.issues()[0].message, "Expected integer, received float");
    assert!(number().int().is_int());
}

#[test]
fn test_number_multiple_of_handles_decimals() {
    let schema = number().multiple_of(0.1).into_schema();
    assert!(schema.guard(0.3));
    assert!(schema.guard(1.2));
    assert_eq!(codes(&schema, 0.35), vec!["not_multiple_of"]);
    assert!(number().step(5.0).into_schema().guard(25));
}

#[test]
fn test_number_finite_safe_precision() {
    assert_eq!(
        codes(&number().finite().into_schema(), f64::INFINITY),
        vec!["not_finite"]
    );
    assert_eq!(
        codes(&number().safe().into_schema(), 2f64.powi(60)),
        vec!["too_big"]
    );
    let precise = number().precision(2).into_schema();
    assert!(precise.guard(1.25));
    assert_eq!(codes(&precise, 1.255), vec!["too_precise"]);
}

#[test]
fn test_number_coercion() {
    let schema = number().coerce().into_schema();
    assert_eq!(schema.parse("42").unwrap(), Value::from(42));
    assert_eq!(schema.parse(json!(true)).unwrap(), Value::from(1));
    assert_eq!(codes(&schema, "abc"), vec!["invalid_type"]);
}

#[test]
fn test_number_effective_bounds() {
    let schema = number().gt(1.0).gte(3.0).max(8.0);
    assert_eq!(schema.min_value(), Some(3.0));
    assert_eq!(schema.max_value(), Some(8.0));
}

// =============================================================================
// BigInt / Boolean / Date
// =============================================================================

#[test]
fn test_bigint() {
    let schema = bigint().gt(3).into_schema();
    assert!(schema.guard(Value::bigint(4)));
    assert_eq!(codes(&schema, Value::bigint(3)), vec!["too_small"]);
    assert_eq!(codes(&schema, 4), vec!["invalid_type"]);

    let coerced = bigint().coerce().into_schema();
    assert_eq!(coerced.parse("12").unwrap(), Value::bigint(12));
    assert_eq!(codes(&coerced, 1.5), vec!["invalid_type"]);
}

#[test]
fn test_bigint_multiple_of() {
    let schema = bigint().multiple_of(4).into_schema();
    assert!(schema.guard(Value::bigint(16)));
    assert_eq!(codes(&schema, Value::bigint(6)), vec!["not_multiple_of"]);
}

#[test]
fn test_boolean() {
    let schema = boolean().into_schema();
    assert!(schema.guard(true));
    assert_eq!(codes(&schema, "true"), vec!["invalid_type"]);

    let coerced = boolean().coerce().into_schema();
    assert_eq!(coerced.parse("").unwrap(), Value::Bool(false));
    assert_eq!(coerced.parse("no").unwrap(), Value::Bool(true));
    assert_eq!(coerced.parse(0).unwrap(), Value::Bool(false));
}

#[test]
fn test_date_bounds() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
    let schema = date().min(start).max(end).into_schema();

    assert!(schema.guard(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
    let error = schema
        .safe_parse(Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap())
        .unwrap_err();
    assert_eq!(
        error.issues()[0].kind,
        IssueKind::TooSmall {
            origin: SizeOrigin::Date,
            minimum: Bound::Date(start),
            inclusive: true,
            exact: false,
        }
    );
    assert_eq!(
        error.issues()[0].message,
        "Date must be greater than or equal to 2024-01-01T00:00:00.000Z"
    );
}

#[test]
fn test_date_coercion() {
    let schema = date().coerce().into_schema();
    let parsed = schema.parse("2024-03-01").unwrap();
    assert_eq!(
        parsed,
        Value::Date(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(codes(&schema, "not a date"), vec!["invalid_date"]);
    assert_eq!(codes(&date().into_schema(), "2024-03-01"), vec!["invalid_type"]);
}

// =============================================================================
// Tags, Literals, Enums
// =============================================================================

#[test]
fn test_tag_schemas() {
    assert!(null().into_schema().guard(json!(null)));
    assert!(!null().into_schema().guard(Value::Undefined));
    assert!(undefined().into_schema().guard(Value::Undefined));
    assert!(void().into_schema().guard(Value::Undefined));
    assert!(any().into_schema().guard(json!({ "a": 1 })));
    assert!(unknown().into_schema().guard(Value::Undefined));
    assert!(nan().into_schema().guard(f64::NAN));
    assert!(!nan().into_schema().guard(1));

    let sym = crate::Symbol::new("id");
    assert!(symbol().into_schema().guard(sym));
    assert_eq!(codes(&symbol().into_schema(), "id"), vec!["invalid_type"]);
}

#[test]
fn test_never_forbids_everything() {
    let error = never().into_schema().safe_parse("x").unwrap_err();
    assert_eq!(
        error.issues()[0].kind,
        IssueKind::Forbidden {
            received: ValueType::String,
        }
    );
    assert!(!never().into_schema().guard(Value::Undefined));
}

#[test]
fn test_literal() {
    let schema = literal("admin").into_schema();
    assert!(schema.guard("admin"));
    let error = schema.safe_parse("user").unwrap_err();
    assert_eq!(error.codes(), vec!["invalid_literal"]);
    assert_eq!(
        error.issues()[0].message,
        "Invalid literal value, expected 'admin'"
    );
    assert!(literal(3).into_schema().guard(3.0));
}

#[test]
fn test_enum() {
    let schema = enumeration(["red", "green", "red"]);
    assert_eq!(schema.values(), ["red", "green"]);

    let error = schema.clone().into_schema().safe_parse("blue").unwrap_err();
    assert_eq!(
        error.issues()[0].message,
        "Invalid enum value. Expected 'red' | 'green', received 'blue'"
    );
    assert_eq!(codes(&schema.clone().into_schema(), 1), vec!["invalid_type"]);
}

#[test]
fn test_enum_extract_and_exclude() {
    let colors = enumeration(["red", "green", "blue"]);
    assert_eq!(colors.extract(&["red", "blue"]).values(), ["red", "blue"]);
    assert_eq!(colors.exclude(&["red"]).values(), ["green", "blue"]);
    assert_eq!(colors.values().len(), 3);
}
