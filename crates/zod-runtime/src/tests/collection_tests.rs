//! Tests for arrays, tuples, sets and records

use crate::prelude::*;
use crate::{Bound, SizeOrigin};
use serde_json::json;

// =============================================================================
// Array
// =============================================================================

#[test]
fn test_array_validates_each_item_at_its_index() {
    let schema = array(number()).into_schema();
    assert_eq!(schema.parse(json!([1, 2])).unwrap(), Value::array([1, 2]));

    let error = schema.safe_parse(json!([1, "two", 3, "four"])).unwrap_err();
    let paths: Vec<String> = error.issues().iter().map(|i| i.path.to_string()).collect();
    assert_eq!(paths, vec!["[1]", "[3]"]);
}

#[test]
fn test_array_size_checks_run_first() {
    let schema = array(number()).min(3).into_schema();
    let error = schema.safe_parse(json!(["a"])).unwrap_err();
    assert_eq!(error.codes(), vec!["too_small", "invalid_type"]);
    assert_eq!(
        error.issues()[0].message,
        "Array must contain at least 3 element(s)"
    );
}

#[test]
fn test_array_size_failure_skips_items_under_abort_early() {
    let schema = array(number()).max(1).with_abort_early(true).into_schema();
    let error = schema.safe_parse(json!(["a", "b"])).unwrap_err();
    assert_eq!(error.codes(), vec!["too_big"]);
}

#[test]
fn test_array_exclusive_bounds_and_length() {
    let schema = array(any()).min_exclusive(1).max_exclusive(3).into_schema();
    assert!(!schema.guard(json!([1])));
    assert!(schema.guard(json!([1, 2])));
    assert!(!schema.guard(json!([1, 2, 3])));

    let exact = array(any()).min(1).length(2);
    assert_eq!(exact.min_items(), Some(2));
    assert_eq!(exact.max_items(), Some(2));
    let error = exact.into_schema().safe_parse(json!([1, 2, 3])).unwrap_err();
    assert_eq!(
        error.issues()[0].kind,
        IssueKind::TooBig {
            origin: SizeOrigin::Array,
            maximum: Bound::Count(2),
            inclusive: true,
            exact: true,
        }
    );
}

#[test]
fn test_array_nonempty_and_unique() {
    assert!(!array(any()).nonempty().into_schema().guard(json!([])));

    let unique = array(number()).unique().into_schema();
    assert!(unique.guard(json!([1, 2, 3])));
    let error = unique.safe_parse(json!([1, 2, 1, 2])).unwrap_err();
    assert_eq!(
        error.issues()[0].kind,
        IssueKind::NotUnique {
            origin: SizeOrigin::Array,
            duplicates: vec![2, 3],
        }
    );
}

#[test]
fn test_array_rejects_sets_and_objects() {
    let schema = array(any()).into_schema();
    assert!(!schema.guard(Value::set([1])));
    assert!(!schema.guard(json!({ "0": 1 })));
}

#[test]
fn test_array_method_on_schema() {
    let schema = string().array().max(2).into_schema();
    assert!(schema.guard(json!(["a", "b"])));
    assert!(!schema.guard(json!(["a", "b", "c"])));
}

// =============================================================================
// Tuple
// =============================================================================

#[test]
fn test_tuple_positions() {
    let schema = tuple([string().into_schema(), number().into_schema()]).into_schema();
    assert!(schema.guard(json!(["a", 1])));

    let error = schema.safe_parse(json!([1, "a"])).unwrap_err();
    let paths: Vec<String> = error.issues().iter().map(|i| i.path.to_string()).collect();
    assert_eq!(paths, vec!["[0]", "[1]"]);
}

#[test]
fn test_tuple_too_short_aborts() {
    let schema = tuple([string().into_schema(), number().into_schema()]).into_schema();
    let error = schema.safe_parse(json!([1])).unwrap_err();
    assert_eq!(
        error.issues(),
        &[crate::Issue::new(
            IssueKind::TooSmall {
                origin: SizeOrigin::Array,
                minimum: Bound::Count(2),
                inclusive: true,
                exact: true,
            },
            Path::root(),
            "Array must contain exactly 2 element(s)",
        )]
    );
}

#[test]
fn test_tuple_too_long_still_checks_items() {
    let schema = tuple([string().into_schema()]).into_schema();
    let error = schema.safe_parse(json!([1, 2])).unwrap_err();
    assert_eq!(error.codes(), vec!["too_big", "invalid_type"]);
}

#[test]
fn test_tuple_rest() {
    let schema = tuple([string().into_schema()]).rest(number());
    assert!(schema.rest_schema().is_some());

    let schema = schema.into_schema();
    assert!(schema.guard(json!(["a"])));
    assert!(schema.guard(json!(["a", 1, 2, 3])));
    let error = schema.safe_parse(json!(["a", 1, "x"])).unwrap_err();
    assert_eq!(error.issues()[0].path.to_string(), "[2]");

    let error = schema.safe_parse(json!([])).unwrap_err();
    assert!(matches!(
        error.issues()[0].kind,
        IssueKind::TooSmall { exact: false, .. }
    ));
}

// =============================================================================
// Set
// =============================================================================

#[test]
fn test_set_members_and_size() {
    let schema = set(number()).min(2).into_schema();
    assert!(schema.guard(Value::set([1, 2])));
    assert!(!schema.guard(json!([1, 2])));

    let error = schema.safe_parse(Value::set([1])).unwrap_err();
    assert_eq!(error.issues()[0].message, "Set must contain at least 2 element(s)");

    let error = schema.safe_parse(Value::set([Value::from(1), Value::from("x")])).unwrap_err();
    assert_eq!(error.issues()[0].path.to_string(), "[1]");
}

#[test]
fn test_set_output_is_deduplicated() {
    let schema = set(string().to_lower_case()).into_schema();
    let parsed = schema.parse(Value::set(["A", "a", "b"])).unwrap();
    assert_eq!(parsed, Value::set(["a", "b"]));
}

#[test]
fn test_set_exact_size() {
    let schema = set(any()).size(2);
    assert_eq!(schema.min_items(), Some(2));
    assert!(!schema.into_schema().guard(Value::set([1, 2, 3])));
}

#[test]
fn test_set_unique_and_exclusive_bounds() {
    let unique = set(number()).unique().into_schema();
    assert!(unique.guard(Value::set([1, 2])));
    let error = unique.safe_parse(Value::set([3, 1, 3])).unwrap_err();
    assert_eq!(
        error.issues()[0].kind,
        IssueKind::NotUnique {
            origin: SizeOrigin::Set,
            duplicates: vec![2],
        }
    );

    let bounded = set(any()).min_exclusive(1).max_exclusive(3);
    assert_eq!(bounded.min_items(), Some(2));
    assert_eq!(bounded.max_items(), Some(2));
    let bounded = bounded.into_schema();
    assert!(bounded.guard(Value::set([1, 2])));
    assert_eq!(bounded.safe_parse(Value::set([1])).unwrap_err().codes(), vec!["too_small"]);
    assert_eq!(bounded.safe_parse(Value::set([1, 2, 3])).unwrap_err().codes(), vec!["too_big"]);
}

// =============================================================================
// Record
// =============================================================================

#[test]
fn test_record_validates_keys_and_values() {
    let schema = record(string().min(2), number()).into_schema();
    assert!(schema.guard(json!({ "ab": 1, "cd": 2 })));

    let error = schema.safe_parse(json!({ "a": 1, "bc": "x" })).unwrap_err();
    assert_eq!(error.codes(), vec!["too_small", "invalid_type"]);
    let paths: Vec<String> = error.issues().iter().map(|i| i.path.to_string()).collect();
    assert_eq!(paths, vec!["a", "bc"]);
}

#[test]
fn test_record_keys_can_be_transformed() {
    let schema = record(string().to_upper_case(), number()).into_schema();
    let parsed = schema.parse(json!({ "a": 1 })).unwrap();
    assert_eq!(parsed.to_json(), json!({ "A": 1 }));
}

#[test]
fn test_record_rejects_arrays() {
    let error = record(string(), any()).into_schema().safe_parse(json!([])).unwrap_err();
    assert_eq!(error.issues()[0].message, "Expected object, received array");
}
