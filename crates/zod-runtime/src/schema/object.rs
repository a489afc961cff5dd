//! Object schemas
//!
//! An [`ObjectSchema`] validates each declared key of its [`Shape`] and then
//! deals with the input keys the shape does not declare:
//!
//! - with a catchall schema, every extra key is validated against it (this
//!   takes precedence over the unknown-key policy);
//! - otherwise [`UnknownKeys::Strip`] drops them, [`UnknownKeys::Passthrough`]
//!   copies them unvalidated after the declared keys, and
//!   [`UnknownKeys::Strict`] raises one `unrecognized_keys` issue naming all
//!   of them in sorted order.
//!
//! A declared key appears in the output when it was present in the input or
//! its parsed value is not `undefined`, so absent optional keys stay absent
//! while defaults still fill in.

use super::condition::{self, When};
use super::{DeleteSchema, EnumSchema, OptionalSchema, Resolve, Schema, SchemaKind, run_all};
use crate::config::SchemaOptions;
use crate::context::{Invalid, ParseContext, ParseResult, ParseReturn};
use crate::issue::IssueKind;
use crate::value::{ObjectMap, Value, ValueType};
use futures::future::FutureExt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declared keys of an object schema, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    fields: IndexMap<String, Schema>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a key. Redeclaring a key replaces its schema in place.
    #[must_use = "This method returns a new Shape and does not modify self"]
    pub fn field(mut self, key: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.fields.insert(key.into(), schema.into());
        self
    }

    /// Declare a key that is dropped from the output.
    #[must_use = "This method returns a new Shape and does not modify self"]
    pub fn delete(self, key: impl Into<String>) -> Self {
        self.field(key, DeleteSchema::new())
    }

    pub fn get(&self, key: &str) -> Option<&Schema> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields.iter().map(|(key, schema)| (key.as_str(), schema))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn insert(&mut self, key: String, schema: Schema) {
        self.fields.insert(key, schema);
    }

    fn map(self, mut f: impl FnMut(&str, Schema) -> Schema) -> Self {
        let fields = self
            .fields
            .into_iter()
            .map(|(key, schema)| {
                let schema = f(&key, schema);
                (key, schema)
            })
            .collect();
        Self { fields }
    }
}

impl<K: Into<String>, S: Into<Schema>> FromIterator<(K, S)> for Shape {
    fn from_iter<I: IntoIterator<Item = (K, S)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, schema)| (key.into(), schema.into()))
                .collect(),
        }
    }
}

/// What happens to input keys the shape does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeys {
    #[default]
    Strip,
    Passthrough,
    Strict,
}

/// Key-value records with a declared shape.
#[derive(Clone, Default)]
pub struct ObjectSchema {
    pub(crate) options: SchemaOptions,
    pub(crate) shape: Shape,
    unknown_keys: UnknownKeys,
    catchall: Option<Schema>,
    pub(crate) conditions: Vec<When>,
}

impl ObjectSchema {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    pub fn catchall_schema(&self) -> Option<&Schema> {
        self.catchall.as_ref()
    }

    pub fn conditions(&self) -> &[When] {
        &self.conditions
    }

    /// Reject undeclared keys.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    /// Drop undeclared keys (the default).
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn strip(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strip;
        self
    }

    /// Keep undeclared keys as they are.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    /// Validate undeclared keys against `schema`, whatever the unknown-key
    /// policy.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn catchall(mut self, schema: impl Into<Schema>) -> Self {
        self.catchall = Some(schema.into());
        self
    }

    /// Rewrite the definition per input before validating it.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn when(mut self, condition: When) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add or replace keys.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn extend(mut self, shape: Shape) -> Self {
        for (key, schema) in shape.fields {
            self.shape.insert(key, schema);
        }
        self
    }

    /// Combine with another object schema. Its keys win, and its unknown-key
    /// policy and catchall replace these.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn merge(mut self, other: ObjectSchema) -> Self {
        for (key, schema) in other.shape.fields {
            self.shape.insert(key, schema);
        }
        self.unknown_keys = other.unknown_keys;
        self.catchall = other.catchall;
        self.conditions.extend(other.conditions);
        self
    }

    /// Keep only the named keys.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn pick(mut self, keys: &[&str]) -> Self {
        self.shape.fields.retain(|key, _| keys.contains(&key.as_str()));
        self
    }

    /// Drop the named keys.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn omit(mut self, keys: &[&str]) -> Self {
        self.shape.fields.retain(|key, _| !keys.contains(&key.as_str()));
        self
    }

    /// Make every key optional.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn partial(mut self) -> Self {
        self.shape = self.shape.map(|_, schema| make_optional(schema));
        self
    }

    /// Make the named keys optional.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn partial_keys(mut self, keys: &[&str]) -> Self {
        self.shape = self.shape.map(|key, schema| {
            if keys.contains(&key) {
                make_optional(schema)
            } else {
                schema
            }
        });
        self
    }

    /// Remove the optional wrapper from every key.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn required(mut self) -> Self {
        self.shape = self.shape.map(|_, schema| match schema.kind() {
            SchemaKind::Optional(optional) => optional.inner().clone(),
            _ => schema,
        });
        self
    }

    /// Enum of the declared keys, delete markers excluded.
    pub fn keyof(&self) -> EnumSchema {
        EnumSchema::new(
            self.shape
                .iter()
                .filter(|(_, schema)| !schema.is_delete())
                .map(|(key, _)| key),
        )
    }

    pub(crate) fn resolve_shape<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        if !matches!(ctx.data(), Value::Object(_)) {
            ctx.invalid_type(&self.options, ValueType::Object);
            return ctx.abort().into();
        }
        let Value::Object(mut input) = ctx.take_data() else {
            return ctx.abort().into();
        };

        let mut slots = Vec::with_capacity(self.shape.len());
        let mut jobs = Vec::with_capacity(input.len());
        for (key, schema) in self.shape.iter() {
            if schema.is_delete() {
                continue;
            }
            let (present, value) = match input.get_mut(key) {
                Some(value) => (true, std::mem::take(value)),
                None => (false, Value::Undefined),
            };
            slots.push((key.to_string(), present));
            jobs.push((schema, ctx.child(key, value)));
        }

        let mut passthrough = ObjectMap::new();
        let mut unrecognized = Vec::new();
        for (key, value) in input {
            if self.shape.contains_key(&key) {
                continue;
            }
            match (&self.catchall, self.unknown_keys) {
                (Some(catchall), _) => {
                    jobs.push((catchall, ctx.child(key.as_str(), value)));
                    slots.push((key, true));
                }
                (None, UnknownKeys::Passthrough) => {
                    passthrough.insert(key, value);
                }
                (None, UnknownKeys::Strict) => unrecognized.push(key),
                (None, UnknownKeys::Strip) => {}
            }
        }

        let options = &self.options;
        run_all(&ctx, jobs).finish(move |results| {
            let mut output = ObjectMap::with_capacity(slots.len() + passthrough.len());
            for ((key, present), result) in slots.into_iter().zip(results) {
                if let Ok(value) = result {
                    if present || !value.is_undefined() {
                        output.insert(key, value);
                    }
                }
            }
            output.extend(passthrough);
            if !unrecognized.is_empty() {
                unrecognized.sort();
                let kind = IssueKind::UnrecognizedKeys { keys: unrecognized };
                ctx.add_issue(options, kind, None);
            }
            ctx.result(Value::Object(output))
        })
    }
}

fn make_optional(schema: Schema) -> Schema {
    match schema.kind() {
        SchemaKind::Optional(_) => schema,
        _ => OptionalSchema::new(schema).into(),
    }
}

impl Resolve for ObjectSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        if self.conditions.is_empty() || !matches!(ctx.data(), Value::Object(_)) {
            return self.resolve_shape(ctx);
        }
        if ctx.is_async() {
            return ParseReturn::Pending(
                async move {
                    let mut outcomes = Vec::with_capacity(self.conditions.len());
                    for condition in &self.conditions {
                        match holds(condition.evaluate(&ctx).into_future().await) {
                            Ok(outcome) => outcomes.push(outcome),
                            Err(invalid) => return Err(invalid),
                        }
                    }
                    let rewritten = condition::apply(self, &outcomes);
                    rewritten.resolve_shape(ctx).into_future().await
                }
                .boxed(),
            );
        }
        let handle = ctx.fork();
        let mut outcomes = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            match holds(handle.settle(condition.evaluate(&ctx))) {
                Ok(outcome) => outcomes.push(outcome),
                Err(invalid) => return ParseReturn::Ready(Err(invalid)),
            }
        }
        let rewritten = condition::apply(self, &outcomes);
        handle.settle(rewritten.resolve_shape(ctx)).into()
    }
}

/// Read a condition outcome; a failure means the parse was stopped.
fn holds(result: ParseResult) -> Result<bool, Invalid> {
    result.map(|value| matches!(value, Value::Bool(true)))
}
