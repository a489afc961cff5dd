//! Unions and intersections

use super::{ObjectSchema, Resolve, Schema, SchemaKind, run_all};
use crate::config::SchemaOptions;
use crate::context::{ParseContext, ParseResult, ParseReturn, SinkHandle};
use crate::error::SchemaError;
use crate::issue::IssueKind;
use crate::value::{Value, ValueType};
use futures::future::{FutureExt, join_all};
use tracing::trace;

// =============================================================================
// Union
// =============================================================================

/// The first member, in declaration order, that accepts the input.
///
/// Each member runs against its own issue sink. When none accepts, one
/// `invalid_union` issue carries every member's issues.
#[derive(Clone)]
pub struct UnionSchema {
    pub(crate) options: SchemaOptions,
    members: Vec<Schema>,
}

impl UnionSchema {
    pub fn new<S: Into<Schema>>(members: impl IntoIterator<Item = S>) -> Self {
        Self {
            options: SchemaOptions::default(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn members(&self) -> &[Schema] {
        &self.members
    }

    /// Pick the outcome from per-member attempts, in member order.
    fn decide(&self, ctx: &ParseContext, attempts: Vec<(ParseResult, SinkHandle)>) -> ParseResult {
        let mut union_errors = Vec::with_capacity(attempts.len());
        let mut chosen = None;
        for (result, sink) in attempts {
            if let Some(usage) = ctx.forward_usage(&sink) {
                return usage;
            }
            let issues = sink.take_issues();
            match result {
                Ok(value) if issues.is_empty() && chosen.is_none() => chosen = Some(value),
                _ => union_errors.push(issues),
            }
        }
        if let Some(value) = chosen {
            return Ok(value);
        }
        trace!(path = %ctx.path(), members = union_errors.len(), "No union member matched");
        ctx.add_issue(&self.options, IssueKind::InvalidUnion { union_errors }, None);
        ctx.abort()
    }
}

impl Resolve for UnionSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        if ctx.is_async() {
            let (pending, sinks): (Vec<_>, Vec<_>) = self
                .members
                .iter()
                .map(|member| {
                    let (attempt, sink) = ctx.detached(ctx.data().clone());
                    (member.run(attempt).into_future(), sink)
                })
                .unzip();
            return ParseReturn::Pending(
                async move {
                    let results = join_all(pending).await;
                    self.decide(&ctx, results.into_iter().zip(sinks).collect())
                }
                .boxed(),
            );
        }

        let mut attempts = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let (attempt, sink) = ctx.detached(ctx.data().clone());
            let handle = attempt.fork();
            let result = handle.settle(member.run(attempt));
            let matched = result.is_ok();
            attempts.push((result, sink));
            if matched {
                break;
            }
        }
        self.decide(&ctx, attempts).into()
    }
}

// =============================================================================
// Discriminated Union
// =============================================================================

/// Object members told apart by the value of one key.
#[derive(Clone)]
pub struct DiscriminatedUnionSchema {
    pub(crate) options: SchemaOptions,
    discriminator: String,
    members: Vec<ObjectSchema>,
    lookup: Vec<(Value, usize)>,
}

impl DiscriminatedUnionSchema {
    /// # Errors
    ///
    /// [`SchemaError::MissingDiscriminator`] when a member's discriminator key
    /// is not a literal, enum, null or undefined schema (possibly wrapped);
    /// [`SchemaError::DuplicateDiscriminator`] when two members share a value.
    pub fn new(
        discriminator: impl Into<String>,
        members: impl IntoIterator<Item = ObjectSchema>,
    ) -> Result<Self, SchemaError> {
        let discriminator = discriminator.into();
        let members: Vec<ObjectSchema> = members.into_iter().collect();
        let mut lookup: Vec<(Value, usize)> = Vec::new();
        for (index, member) in members.iter().enumerate() {
            let values = member
                .shape()
                .get(&discriminator)
                .map(tag_values)
                .unwrap_or_default();
            if values.is_empty() {
                return Err(SchemaError::MissingDiscriminator {
                    discriminator,
                    index,
                });
            }
            for value in values {
                if lookup.iter().any(|(existing, _)| *existing == value) {
                    return Err(SchemaError::DuplicateDiscriminator {
                        discriminator,
                        value: value.to_string(),
                    });
                }
                lookup.push((value, index));
            }
        }
        Ok(Self {
            options: SchemaOptions::default(),
            discriminator,
            members,
            lookup,
        })
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    pub fn members(&self) -> &[ObjectSchema] {
        &self.members
    }

    /// Every accepted discriminator value, in member order.
    pub fn discriminator_values(&self) -> Vec<Value> {
        self.lookup.iter().map(|(value, _)| value.clone()).collect()
    }
}

/// Values a discriminator key schema accepts.
fn tag_values(schema: &Schema) -> Vec<Value> {
    let with = |inner: &Schema, extra: Value| {
        let mut values = tag_values(inner);
        if !values.contains(&extra) {
            values.push(extra);
        }
        values
    };
    match schema.kind() {
        SchemaKind::Literal(literal) => vec![literal.value().clone()],
        SchemaKind::Enum(enumeration) => enumeration.values().iter().map(Value::from).collect(),
        SchemaKind::Null(_) => vec![Value::Null],
        SchemaKind::Undefined(_) => vec![Value::Undefined],
        SchemaKind::Optional(optional) => with(optional.inner(), Value::Undefined),
        SchemaKind::Nullable(nullable) => with(nullable.inner(), Value::Null),
        SchemaKind::Brand(brand) => tag_values(brand.inner()),
        SchemaKind::Readonly(readonly) => tag_values(readonly.inner()),
        SchemaKind::Default(default) => tag_values(default.inner()),
        SchemaKind::Effects(effects) => tag_values(effects.inner()),
        SchemaKind::Lazy(lazy) => tag_values(lazy.schema()),
        _ => Vec::new(),
    }
}

impl Resolve for DiscriminatedUnionSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        let Value::Object(input) = ctx.data() else {
            ctx.invalid_type(&self.options, ValueType::Object);
            return ctx.abort().into();
        };
        let tag = input.get(&self.discriminator).cloned().unwrap_or_default();
        let selected = self
            .lookup
            .iter()
            .find(|(value, _)| *value == tag)
            .and_then(|(_, index)| self.members.get(*index));
        match selected {
            Some(member) => member.resolve(ctx),
            None => {
                let kind = IssueKind::InvalidUnionDiscriminator {
                    discriminator: self.discriminator.clone(),
                    options: self.discriminator_values(),
                };
                ctx.child(self.discriminator.as_str(), tag)
                    .add_issue(&self.options, kind, None);
                ctx.abort().into()
            }
        }
    }
}

// =============================================================================
// Intersection
// =============================================================================

/// Both members must accept the input; their outputs are merged.
///
/// Objects merge key by key, arrays of equal length item by item; anything
/// else must be equal. A conflict raises `invalid_intersection_types`.
#[derive(Clone)]
pub struct IntersectionSchema {
    pub(crate) options: SchemaOptions,
    left: Schema,
    right: Schema,
}

impl IntersectionSchema {
    pub fn new(left: impl Into<Schema>, right: impl Into<Schema>) -> Self {
        Self {
            options: SchemaOptions::default(),
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn left(&self) -> &Schema {
        &self.left
    }

    pub fn right(&self) -> &Schema {
        &self.right
    }
}

impl Resolve for IntersectionSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        let data = ctx.take_data();
        let jobs = vec![
            (&self.left, ctx.with_data(data.clone())),
            (&self.right, ctx.with_data(data)),
        ];
        let options = &self.options;
        run_all(&ctx, jobs).finish(move |results| {
            let mut results = results.into_iter();
            let (Some(Ok(left)), Some(Ok(right))) = (results.next(), results.next()) else {
                return ctx.abort();
            };
            match merge_values(left, right) {
                Some(merged) => ctx.result(merged),
                None => {
                    ctx.add_issue(options, IssueKind::InvalidIntersectionTypes, None);
                    ctx.abort()
                }
            }
        })
    }
}

pub(crate) fn merge_values(left: Value, right: Value) -> Option<Value> {
    match (left, right) {
        (Value::Object(mut left), Value::Object(right)) => {
            for (key, value) in right {
                match left.get_mut(&key) {
                    Some(existing) => {
                        *existing = merge_values(std::mem::take(existing), value)?;
                    }
                    None => {
                        left.insert(key, value);
                    }
                }
            }
            Some(Value::Object(left))
        }
        (Value::Array(left), Value::Array(right)) if left.len() == right.len() => left
            .into_iter()
            .zip(right)
            .map(|(a, b)| merge_values(a, b))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (left, right) if left == right => Some(left),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_objects_key_wise() {
        let left = Value::object([("a", Value::from(1)), ("b", Value::from(2))]);
        let right = Value::object([("b", Value::from(2)), ("c", Value::from(3))]);
        let merged = merge_values(left, right).unwrap();
        assert_eq!(
            merged,
            Value::object([("a", Value::from(1)), ("b", Value::from(2)), ("c", Value::from(3))])
        );
    }

    #[test]
    fn test_merge_conflict() {
        assert!(merge_values(Value::from(1), Value::from(2)).is_none());
        assert!(merge_values(Value::array([1, 2]), Value::array([1])).is_none());
    }
}
