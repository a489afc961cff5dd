//! Tests for wrappers, effects and pipelines

use crate::prelude::*;
use crate::schema::{CatchContext, SchemaKind};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// Optional / Nullable / Defined
// =============================================================================

#[test]
fn test_optional_and_nullable() {
    let maybe = string().optional();
    assert_eq!(maybe.parse(Value::Undefined).unwrap(), Value::Undefined);
    assert!(!maybe.guard(json!(null)));

    let nullable = string().nullable();
    assert_eq!(nullable.parse(json!(null)).unwrap(), Value::Null);
    assert!(!nullable.guard(Value::Undefined));

    let nullish = string().nullish();
    assert!(nullish.guard(Value::Undefined));
    assert!(nullish.guard(json!(null)));
    assert!(!nullish.guard(1));
}

#[test]
fn test_defined_raises_required() {
    let schema = string().optional().defined();
    let error = schema.safe_parse(Value::Undefined).unwrap_err();
    assert_eq!(error.codes(), vec!["required"]);
    assert_eq!(error.issues()[0].message, "Required");
    assert!(schema.guard("x"));
}

#[test]
fn test_required_message_override() {
    let schema = string().required_message("name is needed").into_schema();
    let error = schema.safe_parse(Value::Undefined).unwrap_err();
    assert_eq!(error.issues()[0].message, "name is needed");

    let error = schema.safe_parse(3).unwrap_err();
    assert_eq!(error.issues()[0].message, "Expected string, received number");
}

// =============================================================================
// Default / Catch
// =============================================================================

#[test]
fn test_default_replaces_undefined_only() {
    let schema = number().default(5);
    assert_eq!(schema.parse(Value::Undefined).unwrap(), Value::from(5));
    assert_eq!(schema.parse(7).unwrap(), Value::from(7));
    assert!(!schema.guard(json!(null)));
}

#[test]
fn test_default_value_is_validated() {
    let schema = number().min(10.0).default(5);
    let error = schema.safe_parse(Value::Undefined).unwrap_err();
    assert_eq!(error.codes(), vec!["too_small"]);
}

#[test]
fn test_default_producer_runs_per_parse() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let schema = array(string()).default_with(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Value::array(Vec::<Value>::new())
    });

    assert_eq!(schema.parse(Value::Undefined).unwrap(), Value::array(Vec::<Value>::new()));
    assert_eq!(schema.parse(Value::Undefined).unwrap(), Value::array(Vec::<Value>::new()));
    schema.parse(json!(["a"])).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_catch_swallows_issues() {
    let schema = number().catch(0);
    assert_eq!(schema.parse("oops").unwrap(), Value::from(0));
    assert_eq!(schema.parse(4).unwrap(), Value::from(4));
}

#[test]
fn test_catch_producer_sees_error() {
    let schema = string().min(3).catch_with(|caught: &CatchContext| {
        Value::from(format!("{}:{}", caught.input.to_js_string(), caught.error.codes()[0]))
    });
    assert_eq!(schema.parse("ab").unwrap(), Value::from("ab:too_small"));
}

#[test]
fn test_catch_inside_object_keeps_siblings_failing() {
    let schema: Schema = object(
        Shape::new()
            .field("a", number().catch(1))
            .field("b", number()),
    )
    .into();
    let error = schema.safe_parse(json!({ "a": "x", "b": "y" })).unwrap_err();
    assert_eq!(error.len(), 1);
    assert_eq!(error.issues()[0].path.to_string(), "b");
}

// =============================================================================
// Brand / Readonly / Describe
// =============================================================================

#[test]
fn test_brand_and_readonly_are_transparent() {
    let schema = string().brand("UserId").readonly();
    assert_eq!(schema.parse("u1").unwrap(), Value::from("u1"));
    assert!(!schema.guard(1));
    match schema.kind() {
        SchemaKind::Readonly(readonly) => match readonly.inner().kind() {
            SchemaKind::Brand(brand) => assert_eq!(brand.brand(), "UserId"),
            _ => panic!("expected a brand node"),
        },
        _ => panic!("expected a readonly node"),
    }
}

#[test]
fn test_describe() {
    let schema = string().describe("display name");
    assert_eq!(schema.description(), Some("display name"));
    assert_eq!(schema.into_schema().description(), Some("display name"));
}

// =============================================================================
// Effects
// =============================================================================

#[test]
fn test_refine() {
    let even = number().refine(|v| v.as_f64().is_some_and(|n| n % 2.0 == 0.0), "must be even");
    assert!(even.guard(4));
    let error = even.safe_parse(3).unwrap_err();
    assert_eq!(error.codes(), vec!["custom"]);
    assert_eq!(error.issues()[0].message, "must be even");
}

#[test]
fn test_refine_skipped_when_inner_fails() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let schema = number().refine(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        },
        "never",
    );
    assert!(!schema.guard("x"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_super_refine_raises_several_issues() {
    let schema = array(number()).super_refine(|value, ctx| {
        let items = value.as_array().unwrap_or_default();
        if items.len() > 2 {
            ctx.custom("too many items");
        }
        if items.first() != items.last() {
            ctx.add_issue_at(
                Path::root().child(0),
                IssueKind::custom(),
                Some("first and last differ".to_string()),
            );
        }
    });

    let error = schema.safe_parse(json!([1, 2, 3])).unwrap_err();
    assert_eq!(error.len(), 2);
    assert_eq!(error.issues()[0].message, "too many items");
    assert_eq!(error.issues()[1].path.to_string(), "[0]");
}

#[test]
fn test_transform() {
    let schema = string().transform(|v, _| Value::from(v.as_str().map_or(0, str::len)));
    assert_eq!(schema.parse("hello").unwrap(), Value::from(5));
}

#[test]
fn test_transform_can_fail() {
    let schema = string().transform(|v, ctx| match v.as_str().and_then(|s| s.parse::<f64>().ok()) {
        Some(n) => Value::from(n),
        None => {
            ctx.custom("not numeric");
            Value::Undefined
        }
    });
    assert_eq!(schema.parse("2.5").unwrap(), Value::from(2.5));
    let error = schema.safe_parse("x").unwrap_err();
    assert_eq!(error.issues()[0].message, "not numeric");
}

#[test]
fn test_preprocess() {
    let schema = preprocess(
        |v| match v {
            Value::String(s) => Value::from(s.trim().to_string()),
            other => other,
        },
        string().min(1),
    )
    .into_schema();
    assert_eq!(schema.parse("  a ").unwrap(), Value::from("a"));
    assert!(!schema.guard("   "));
}

// =============================================================================
// Pipeline / Lazy / Delete
// =============================================================================

#[test]
fn test_pipeline_feeds_output_forward() {
    let schema = string()
        .transform(|v, _| Value::from(v.as_str().map_or(0, str::len)))
        .pipe(number().min(3.0));
    assert_eq!(schema.parse("abcd").unwrap(), Value::from(4));
    assert_eq!(schema.safe_parse("ab").unwrap_err().codes(), vec!["too_small"]);
    assert_eq!(schema.safe_parse(1).unwrap_err().codes(), vec!["invalid_type"]);
}

#[test]
fn test_pipeline_factory() {
    let schema = pipeline(string().coerce(), string().email()).into_schema();
    assert!(schema.guard("ada@example.com"));
    assert!(!schema.guard(12));
}

#[test]
fn test_lazy_recursive_schema() {
    fn category() -> Schema {
        object(
            Shape::new()
                .field("name", string())
                .field("children", array(lazy(category))),
        )
        .into()
    }

    let schema = category();
    let tree = json!({
        "name": "root",
        "children": [
            { "name": "a", "children": [] },
            { "name": "b", "children": [{ "name": "c", "children": [] }] }
        ]
    });
    assert!(schema.guard(tree));

    let broken = json!({
        "name": "root",
        "children": [{ "name": "a", "children": [{ "name": 1, "children": [] }] }]
    });
    let error = schema.safe_parse(broken).unwrap_err();
    assert_eq!(error.issues()[0].path.to_string(), "children[0].children[0].name");
}

#[test]
fn test_delete_outside_object_yields_undefined() {
    assert_eq!(delete().into_schema().parse("x").unwrap(), Value::Undefined);
}
