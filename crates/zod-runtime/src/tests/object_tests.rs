//! Tests for object schemas: unknown keys, shape helpers, conditions and
//! references

use crate::prelude::*;
use crate::schema::{ObjectSchema, SchemaKind, UnknownKeys};
use serde_json::json;

fn user() -> ObjectSchema {
    object(
        Shape::new()
            .field("name", string().min(1))
            .field("age", number().int().nonnegative())
            .field("nick", string().optional()),
    )
}

// =============================================================================
// Declared Keys
// =============================================================================

#[test]
fn test_object_parses_declared_keys() {
    let parsed = user()
        .into_schema()
        .parse(json!({ "name": "Ada", "age": 36 }))
        .unwrap();
    assert_eq!(parsed.to_json(), json!({ "name": "Ada", "age": 36 }));
    assert!(!parsed.as_object().unwrap().contains_key("nick"));
}

#[test]
fn test_object_rejects_non_objects() {
    let error = user().into_schema().safe_parse(json!([1])).unwrap_err();
    assert_eq!(error.issues()[0].message, "Expected object, received array");
    assert!(error.issues()[0].path.is_empty());
}

#[test]
fn test_missing_keys_are_reported_at_their_path() {
    let error = user().into_schema().safe_parse(json!({})).unwrap_err();
    let paths: Vec<String> = error.issues().iter().map(|i| i.path.to_string()).collect();
    assert_eq!(paths, vec!["name", "age"]);
    assert!(error.issues().iter().all(|i| i.message == "Required"));
}

#[test]
fn test_present_undefined_key_is_kept() {
    let input = Value::object([("name", Value::from("Ada")), ("age", Value::from(1)), ("nick", Value::Undefined)]);
    let parsed = user().into_schema().parse(input).unwrap();
    assert_eq!(parsed.get("nick"), Some(&Value::Undefined));
}

#[test]
fn test_defaults_fill_absent_keys() {
    let schema: Schema = object(Shape::new().field("role", string().default("user"))).into();
    let parsed = schema.parse(json!({})).unwrap();
    assert_eq!(parsed.get("role"), Some(&Value::from("user")));
}

#[test]
fn test_output_follows_declaration_order() {
    let schema: Schema = object(Shape::new().field("b", number()).field("a", number())).into();
    let parsed = schema.parse(json!({ "a": 1, "b": 2 })).unwrap();
    let keys: Vec<&str> = parsed.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["b", "a"]);
}

// =============================================================================
// Unknown Keys
// =============================================================================

#[test]
fn test_strip_is_the_default() {
    let schema = user();
    assert_eq!(schema.unknown_keys(), UnknownKeys::Strip);
    let parsed = schema
        .into_schema()
        .parse(json!({ "name": "Ada", "age": 1, "extra": true }))
        .unwrap();
    assert!(parsed.get("extra").is_none());
}

#[test]
fn test_passthrough_keeps_extras_after_declared_keys() {
    let parsed = user()
        .passthrough()
        .into_schema()
        .parse(json!({ "extra": true, "name": "Ada", "age": 1 }))
        .unwrap();
    let keys: Vec<&str> = parsed.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["name", "age", "extra"]);
}

#[test]
fn test_strict_reports_sorted_keys_after_children() {
    let error = user()
        .strict()
        .into_schema()
        .safe_parse(json!({ "zeta": 1, "name": "", "alpha": 2, "age": 1 }))
        .unwrap_err();
    assert_eq!(error.codes(), vec!["too_small", "unrecognized_keys"]);
    assert_eq!(
        error.issues()[1].kind,
        IssueKind::UnrecognizedKeys {
            keys: vec!["alpha".to_string(), "zeta".to_string()],
        }
    );
    assert_eq!(
        error.issues()[1].message,
        "Unrecognized key(s) in object: 'alpha', 'zeta'"
    );
}

#[test]
fn test_catchall_wins_over_policy() {
    let schema = user().strict().catchall(number()).into_schema();
    let parsed = schema
        .parse(json!({ "name": "Ada", "age": 1, "score": 9 }))
        .unwrap();
    assert_eq!(parsed.get("score"), Some(&Value::from(9)));

    let error = schema
        .safe_parse(json!({ "name": "Ada", "age": 1, "score": "high" }))
        .unwrap_err();
    assert_eq!(error.codes(), vec!["invalid_type"]);
    assert_eq!(error.issues()[0].path.to_string(), "score");
}

#[test]
fn test_delete_marker_drops_key() {
    let schema = object(Shape::new().field("name", string()).delete("password"));
    assert_eq!(schema.keyof().values(), ["name"]);

    let parsed = schema
        .strict()
        .into_schema()
        .parse(json!({ "name": "Ada", "password": "hunter2" }))
        .unwrap();
    assert_eq!(parsed.to_json(), json!({ "name": "Ada" }));
}

// =============================================================================
// Shape Helpers
// =============================================================================

#[test]
fn test_pick_and_omit() {
    let picked = user().pick(&["name"]);
    assert_eq!(picked.shape().keys().collect::<Vec<_>>(), vec!["name"]);

    let omitted = user().omit(&["nick", "age"]);
    assert_eq!(omitted.shape().keys().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn test_extend_replaces_in_place() {
    let extended = user().extend(Shape::new().field("age", string()).field("email", string()));
    assert_eq!(
        extended.shape().keys().collect::<Vec<_>>(),
        vec!["name", "age", "nick", "email"]
    );
    assert!(matches!(
        extended.shape().get("age").map(Schema::kind),
        Some(SchemaKind::String(_))
    ));
}

#[test]
fn test_merge_takes_other_policy() {
    let other = object(Shape::new().field("email", string().email())).strict();
    let merged = user().merge(other);
    assert_eq!(merged.unknown_keys(), UnknownKeys::Strict);
    assert_eq!(merged.shape().len(), 4);
}

#[test]
fn test_partial_and_required() {
    let partial = user().partial().into_schema();
    assert!(partial.guard(json!({})));

    let some = user().partial_keys(&["age"]).into_schema();
    assert!(some.guard(json!({ "name": "Ada" })));
    assert!(!some.guard(json!({ "age": 3 })));

    let strict = user().required().into_schema();
    let error = strict.safe_parse(json!({ "name": "Ada", "age": 1 })).unwrap_err();
    assert_eq!(error.issues()[0].path.to_string(), "nick");
}

#[test]
fn test_partial_does_not_double_wrap() {
    let partial = user().partial();
    match partial.shape().get("nick").map(Schema::kind) {
        Some(SchemaKind::Optional(optional)) => {
            assert!(matches!(optional.inner().kind(), SchemaKind::String(_)));
        }
        _ => panic!("expected an optional node"),
    }
}

#[test]
fn test_keyof() {
    let keys = user().keyof();
    assert_eq!(keys.values(), ["name", "age", "nick"]);
}

// =============================================================================
// Abort Early
// =============================================================================

#[test]
fn test_all_issues_by_default() {
    let error = user()
        .into_schema()
        .safe_parse(json!({ "name": "", "age": -1.5 }))
        .unwrap_err();
    assert_eq!(error.codes(), vec!["too_small", "not_integer", "too_small"]);
}

#[test]
fn test_abort_early_from_parse_options() {
    let options = ParseOptions::new().with_abort_early(true);
    let error = user()
        .into_schema()
        .safe_parse_with(json!({ "name": "", "age": -1.5 }), &options)
        .unwrap_err();
    assert_eq!(error.len(), 1);
    assert_eq!(error.issues()[0].path.to_string(), "name");
}

#[test]
fn test_abort_early_from_schema_options() {
    let schema = user().with_abort_early(true).into_schema();
    let error = schema.safe_parse(json!({ "name": "", "age": -1.5 })).unwrap_err();
    assert_eq!(error.len(), 1);

    let options = ParseOptions::new().with_abort_early(false);
    let error = schema
        .safe_parse_with(json!({ "name": "", "age": -1.5 }), &options)
        .unwrap_err();
    assert_eq!(error.len(), 3);
}

#[test]
fn test_parse_options_path_prefix() {
    let options = ParseOptions::new().with_path(Path::parse("body.user").unwrap());
    let error = user()
        .into_schema()
        .safe_parse_with(json!({ "age": 1 }), &options)
        .unwrap_err();
    assert_eq!(error.issues()[0].path.to_string(), "body.user.name");
}

// =============================================================================
// Conditions
// =============================================================================

fn payment() -> ObjectSchema {
    object(
        Shape::new()
            .field("method", enumeration(["card", "transfer"]))
            .field("card_number", string().optional())
            .field("iban", string().optional()),
    )
    .when(
        When::new("method", Predicate::equals("card"))
            .unwrap()
            .then(|schema| schema.extend(Shape::new().field("card_number", string().length(16))))
            .otherwise(|schema| schema.extend(Shape::new().field("iban", string().min(15)))),
    )
}

#[test]
fn test_condition_then_branch() {
    let schema = payment().into_schema();
    assert!(schema.guard(json!({ "method": "card", "card_number": "4111111111111111" })));

    let error = schema.safe_parse(json!({ "method": "card" })).unwrap_err();
    assert_eq!(error.issues()[0].path.to_string(), "card_number");
}

#[test]
fn test_condition_otherwise_branch() {
    let schema = payment().into_schema();
    assert!(schema.guard(json!({ "method": "transfer", "iban": "DE89370400440532013000" })));
    let error = schema.safe_parse(json!({ "method": "transfer" })).unwrap_err();
    assert_eq!(error.issues()[0].path.to_string(), "iban");
}

#[test]
fn test_condition_does_not_change_declared_schema() {
    let schema = payment();
    let _ = schema.clone().into_schema().safe_parse(json!({ "method": "card" }));
    assert!(matches!(
        schema.shape().get("card_number").map(Schema::kind),
        Some(SchemaKind::Optional(_))
    ));
    assert_eq!(schema.conditions().len(), 1);
}

#[test]
fn test_condition_predicates() {
    assert_eq!(Predicate::exists().test(Some(&Value::from(0))), Ok(true));
    assert_eq!(Predicate::exists().test(Some(&Value::Undefined)), Ok(false));
    assert_eq!(Predicate::exists().test(None), Ok(false));
    assert_eq!(Predicate::equals(Value::Undefined).test(None), Ok(true));
    assert_eq!(Predicate::matches(number().gt(5.0)).test(Some(&Value::from(6))), Ok(true));
    assert_eq!(Predicate::matches(number().gt(5.0)).test(Some(&Value::from(4))), Ok(false));
    assert_eq!(Predicate::func(|v| v.is_truthy()).test(Some(&Value::from("x"))), Ok(true));
}

#[test]
fn test_condition_on_nested_path() {
    let schema: Schema = object(
        Shape::new()
            .field("account", object(Shape::new().field("kind", string())))
            .field("vat", string().optional()),
    )
    .when(
        When::new("account.kind", Predicate::equals("business"))
            .unwrap()
            .then(|schema| schema.extend(Shape::new().field("vat", string()))),
    )
    .into();

    assert!(schema.guard(json!({ "account": { "kind": "private" } })));
    assert!(!schema.guard(json!({ "account": { "kind": "business" } })));
}

#[test]
fn test_condition_path_must_parse() {
    assert!(matches!(
        When::new("a..b", Predicate::exists()),
        Err(SchemaError::InvalidPath(_))
    ));
}

// =============================================================================
// References
// =============================================================================

fn address() -> ObjectSchema {
    object(
        Shape::new()
            .field("street", string())
            .field("zip", string().length(5)),
    )
}

#[test]
fn test_reference_copies_target_schema() {
    let schema = object(Shape::new().field("billing", address()))
        .with_reference("shipping", "billing")
        .unwrap()
        .into_schema();

    let error = schema
        .safe_parse(json!({
            "billing": { "street": "Main", "zip": "12345" },
            "shipping": { "street": "Side", "zip": "1" }
        }))
        .unwrap_err();
    assert_eq!(error.issues()[0].path.to_string(), "shipping.zip");
}

#[test]
fn test_reference_into_nested_slot() {
    let schema = object(
        Shape::new()
            .field("country", enumeration(["DE", "FR"]))
            .field("billing", address()),
    )
    .with_reference("billing.country", "country")
    .unwrap();

    let billing = schema.shape().get("billing").unwrap();
    match billing.kind() {
        SchemaKind::Object(inner) => assert!(inner.shape().contains_key("country")),
        _ => panic!("expected an object node"),
    }
}

#[test]
fn test_reference_chain() {
    let schema = object(Shape::new().field("a", number()))
        .with_references([("b", "a"), ("c", "b")])
        .unwrap();
    assert_eq!(schema.shape().len(), 3);
}

#[test]
fn test_reference_errors() {
    let base = || {
        object(
            Shape::new()
                .field("name", string())
                .field("billing", address())
                .delete("legacy"),
        )
    };

    assert!(matches!(
        base().with_reference("copy", "missing"),
        Err(SchemaError::MissingTarget { .. })
    ));
    assert!(matches!(
        base().with_reference("copy", "name.first"),
        Err(SchemaError::NotTraversable { kind: "string", .. })
    ));
    assert!(matches!(
        base().with_reference("copy", "legacy"),
        Err(SchemaError::DeletedTarget { .. })
    ));
    assert!(matches!(
        base().with_reference("name", "name"),
        Err(SchemaError::SelfReference { .. })
    ));
    assert!(matches!(
        base().with_reference("billing.copy", "billing"),
        Err(SchemaError::CyclicReference { .. })
    ));
    assert!(matches!(
        base().with_reference("name", "billing"),
        Err(SchemaError::SlotOccupied { .. })
    ));
    assert!(matches!(
        base().with_reference("copy", "bad[path"),
        Err(SchemaError::InvalidPath(_))
    ));
}

#[test]
fn test_tuple_references() {
    let pair = tuple([string().into_schema(), number().into_schema()]);
    let triple = pair.clone().with_reference(2, "0").unwrap();
    assert_eq!(triple.items().len(), 3);
    assert!(triple.into_schema().guard(json!(["a", 1, "b"])));

    assert!(matches!(
        pair.clone().with_reference(5, "0"),
        Err(SchemaError::SlotOutOfRange { len: 2, .. })
    ));
    assert!(matches!(
        pair.with_reference(1, "0"),
        Err(SchemaError::SlotOccupied { .. })
    ));
}
