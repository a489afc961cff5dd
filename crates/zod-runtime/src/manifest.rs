//! Schema manifests
//!
//! A [`Manifest`] is a read-only description of a schema for documentation
//! and form builders. `required` and `nullable` are computed by running the
//! schema against `undefined` and `null`, so they always agree with what the
//! schema accepts.

use crate::schema::{Schema, SchemaKind};
use crate::value::Value;
use serde::Serialize;

/// Descriptive record of one schema node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// Kind of the innermost schema, wrappers removed
    #[serde(rename = "type")]
    pub type_name: &'static str,
    /// False iff the schema accepts `undefined`
    pub required: bool,
    /// True iff the schema accepts `null`
    pub nullable: bool,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Lower bound: a length, an item count or a value, depending on the kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl Schema {
    pub fn manifest(&self) -> Manifest {
        let core = innermost(self);
        let (minimum, maximum) = bounds(core.kind());
        Manifest {
            type_name: core.kind().name(),
            required: !self.accepts(&Value::Undefined),
            nullable: self.accepts(&Value::Null),
            readonly: layers(self).any(|layer| matches!(layer.kind(), SchemaKind::Readonly(_))),
            description: layers(self).find_map(|layer| layer.kind().options().description.clone()),
            minimum,
            maximum,
        }
    }
}

/// The child a wrapper defers to, or `None` for every other kind.
fn wrapped_child(kind: &SchemaKind) -> Option<&Schema> {
    match kind {
        SchemaKind::Optional(node) => Some(node.inner()),
        SchemaKind::Nullable(node) => Some(node.inner()),
        SchemaKind::Defined(node) => Some(node.inner()),
        SchemaKind::Default(node) => Some(node.inner()),
        SchemaKind::Catch(node) => Some(node.inner()),
        SchemaKind::Brand(node) => Some(node.inner()),
        SchemaKind::Readonly(node) => Some(node.inner()),
        SchemaKind::Effects(node) => Some(node.inner()),
        SchemaKind::Lazy(node) => Some(node.schema()),
        SchemaKind::Pipeline(node) => Some(node.input()),
        SchemaKind::String(_)
        | SchemaKind::Number(_)
        | SchemaKind::BigInt(_)
        | SchemaKind::Boolean(_)
        | SchemaKind::Date(_)
        | SchemaKind::Symbol(_)
        | SchemaKind::Undefined(_)
        | SchemaKind::Null(_)
        | SchemaKind::Void(_)
        | SchemaKind::Any(_)
        | SchemaKind::Unknown(_)
        | SchemaKind::Never(_)
        | SchemaKind::Nan(_)
        | SchemaKind::Literal(_)
        | SchemaKind::Enum(_)
        | SchemaKind::Promise(_)
        | SchemaKind::Delete(_)
        | SchemaKind::Object(_)
        | SchemaKind::Array(_)
        | SchemaKind::Tuple(_)
        | SchemaKind::Set(_)
        | SchemaKind::Record(_)
        | SchemaKind::Union(_)
        | SchemaKind::DiscriminatedUnion(_)
        | SchemaKind::Intersection(_) => None,
    }
}

/// The schema and every wrapped child, outermost first.
fn layers(schema: &Schema) -> impl Iterator<Item = &Schema> {
    std::iter::successors(Some(schema), |layer| wrapped_child(layer.kind()))
}

fn innermost(schema: &Schema) -> &Schema {
    layers(schema).last().unwrap_or(schema)
}

fn count(value: Option<usize>) -> Option<f64> {
    value.map(|n| n as f64)
}

fn bounds(kind: &SchemaKind) -> (Option<f64>, Option<f64>) {
    match kind {
        SchemaKind::String(node) => (count(node.min_length()), count(node.max_length())),
        SchemaKind::Number(node) => (node.min_value(), node.max_value()),
        SchemaKind::Array(node) => (count(node.min_items()), count(node.max_items())),
        SchemaKind::Set(node) => (count(node.min_items()), count(node.max_items())),
        SchemaKind::Tuple(node) => {
            let fixed = count(Some(node.items().len()));
            (fixed, if node.rest_schema().is_some() { None } else { fixed })
        }
        _ => (None, None),
    }
}
