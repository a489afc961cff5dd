//! Tests for unions, discriminated unions and intersections

use crate::prelude::*;
use crate::schema::ObjectSchema;
use serde_json::json;

// =============================================================================
// Union
// =============================================================================

#[test]
fn test_union_first_match_wins() {
    let schema = union([
        string().transform(|_, _| Value::from("first")),
        string().transform(|_, _| Value::from("second")),
    ])
    .into_schema();
    assert_eq!(schema.parse("x").unwrap(), Value::from("first"));
}

#[test]
fn test_union_falls_through_to_later_member() {
    let schema = string().or(number());
    assert_eq!(schema.parse(3).unwrap(), Value::from(3));
    assert_eq!(schema.parse("3").unwrap(), Value::from("3"));
}

#[test]
fn test_union_failure_collects_member_issues() {
    let schema = union([string().into_schema(), number().into_schema()]).into_schema();
    let error = schema.safe_parse(json!(true)).unwrap_err();
    assert_eq!(error.codes(), vec!["invalid_union"]);
    assert_eq!(error.issues()[0].message, "Invalid input");

    match &error.issues()[0].kind {
        IssueKind::InvalidUnion { union_errors } => {
            assert_eq!(union_errors.len(), 2);
            assert_eq!(union_errors[0][0].code(), "invalid_type");
            assert_eq!(union_errors[1][0].code(), "invalid_type");
        }
        other => panic!("unexpected issue {:?}", other),
    }
}

#[test]
fn test_union_member_issues_do_not_leak() {
    let schema: Schema = object(
        Shape::new().field("id", union([number().int().into_schema(), string().uuid().into_schema()])),
    )
    .into();
    let parsed = schema.parse(json!({ "id": 7 })).unwrap();
    assert_eq!(parsed.get("id"), Some(&Value::from(7)));

    let error = schema.safe_parse(json!({ "id": 1.5 })).unwrap_err();
    assert_eq!(error.len(), 1);
    assert_eq!(error.issues()[0].path.to_string(), "id");
}

#[test]
fn test_nullable_union_via_or() {
    let schema = literal("a").or(literal("b")).nullable();
    assert!(schema.guard("b"));
    assert!(schema.guard(json!(null)));
    assert!(!schema.guard("c"));
}

// =============================================================================
// Discriminated Union
// =============================================================================

fn shapes() -> Vec<ObjectSchema> {
    vec![
        object(
            Shape::new()
                .field("kind", literal("circle"))
                .field("radius", number().positive()),
        ),
        object(
            Shape::new()
                .field("kind", enumeration(["square", "box"]))
                .field("side", number().positive()),
        ),
    ]
}

#[test]
fn test_discriminated_union_selects_by_tag() {
    let schema = discriminated_union("kind", shapes()).unwrap();
    assert_eq!(
        schema.discriminator_values(),
        vec![Value::from("circle"), Value::from("square"), Value::from("box")]
    );

    let schema = schema.into_schema();
    assert!(schema.guard(json!({ "kind": "circle", "radius": 1 })));
    assert!(schema.guard(json!({ "kind": "box", "side": 2 })));

    let error = schema.safe_parse(json!({ "kind": "circle", "side": 2 })).unwrap_err();
    assert_eq!(error.issues()[0].path.to_string(), "radius");
}

#[test]
fn test_discriminated_union_bad_tag() {
    let schema = discriminated_union("kind", shapes()).unwrap().into_schema();
    let error = schema.safe_parse(json!({ "kind": "triangle" })).unwrap_err();
    assert_eq!(error.codes(), vec!["invalid_union_discriminator"]);
    assert_eq!(error.issues()[0].path.to_string(), "kind");
    assert_eq!(
        error.issues()[0].message,
        "Invalid discriminator value. Expected 'circle' | 'square' | 'box'"
    );

    let error = schema.safe_parse(json!("circle")).unwrap_err();
    assert_eq!(error.codes(), vec!["invalid_type"]);
}

#[test]
fn test_discriminated_union_sees_through_wrappers() {
    let members = vec![
        object(Shape::new().field("type", literal("a").optional())),
        object(Shape::new().field("type", literal("b"))),
    ];
    let schema = discriminated_union("type", members).unwrap();
    assert!(schema.discriminator_values().contains(&Value::Undefined));
    assert!(schema.into_schema().guard(json!({})));
}

#[test]
fn test_discriminated_union_construction_errors() {
    let missing = vec![object(Shape::new().field("kind", string()))];
    assert!(matches!(
        discriminated_union("kind", missing),
        Err(SchemaError::MissingDiscriminator { index: 0, .. })
    ));

    let duplicate = vec![
        object(Shape::new().field("kind", literal("x"))),
        object(Shape::new().field("kind", enumeration(["y", "x"]))),
    ];
    assert!(matches!(
        discriminated_union("kind", duplicate),
        Err(SchemaError::DuplicateDiscriminator { .. })
    ));
}

// =============================================================================
// Intersection
// =============================================================================

#[test]
fn test_intersection_merges_objects() {
    let named = object(Shape::new().field("name", string())).passthrough();
    let aged = object(Shape::new().field("age", number())).passthrough();
    let schema = named.and(aged);

    let parsed = schema.parse(json!({ "name": "Ada", "age": 36 })).unwrap();
    assert_eq!(parsed.to_json(), json!({ "name": "Ada", "age": 36 }));

    let error = schema.safe_parse(json!({ "name": 1, "age": "x" })).unwrap_err();
    assert_eq!(error.codes(), vec!["invalid_type", "invalid_type"]);
}

#[test]
fn test_intersection_of_primitives() {
    let schema = intersection(string().min(2), string().max(4)).into_schema();
    assert!(schema.guard("abc"));
    assert!(!schema.guard("a"));
    assert!(!schema.guard("abcde"));
}

#[test]
fn test_intersection_conflict() {
    let schema = intersection(
        string().transform(|_, _| Value::from("left")),
        string().transform(|_, _| Value::from("right")),
    )
    .into_schema();
    let error = schema.safe_parse("x").unwrap_err();
    assert_eq!(error.codes(), vec!["invalid_intersection_types"]);
    assert_eq!(
        error.issues()[0].message,
        "Intersection results could not be merged"
    );
}
