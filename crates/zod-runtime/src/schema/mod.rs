//! Schema nodes
//!
//! A [`Schema`] is a cheap, shareable handle over one node of a schema tree.
//! Every kind of node is a variant of the closed [`SchemaKind`] enum and has a
//! typed builder struct ([`StringSchema`], [`ObjectSchema`], ...) that converts
//! into a `Schema`. Builders are immutable values: every modifier returns a
//! new node and never changes the receiver.
//!
//! # Example
//!
//! ```rust,ignore
//! use zod_runtime::prelude::*;
//! use serde_json::json;
//!
//! let user: Schema = object(
//!     Shape::new()
//!         .field("name", string().min(2))
//!         .field("age", number().int().nonnegative().optional()),
//! )
//! .strict()
//! .into();
//!
//! assert!(user.guard(json!({ "name": "Ada" })));
//! let error = user.safe_parse(json!({ "name": "A", "extra": 1 })).unwrap_err();
//! assert_eq!(error.codes(), vec!["too_small", "unrecognized_keys"]);
//! ```

mod coerce;
mod collections;
mod condition;
mod effects;
mod object;
mod primitives;
mod references;
mod union;
mod wrappers;

pub use collections::{ArraySchema, RecordSchema, SetSchema, TupleSchema};
pub use condition::{Branch, Predicate, When};
pub use effects::{Effect, EffectsSchema, RefinementContext};
pub use object::{ObjectSchema, Shape, UnknownKeys};
pub use primitives::{
    AnySchema, BigIntSchema, BooleanSchema, DateSchema, EnumSchema, LiteralSchema, NanSchema,
    NeverSchema, NullSchema, NumberSchema, StringSchema, SymbolSchema, UndefinedSchema,
    UnknownSchema, VoidSchema,
};
pub use union::{DiscriminatedUnionSchema, IntersectionSchema, UnionSchema};
pub use wrappers::{
    BrandSchema, CatchContext, CatchSchema, DefaultSchema, DefinedSchema, DeleteSchema,
    LazySchema, NullableSchema, OptionalSchema, PipelineSchema, PromiseSchema, ReadonlySchema,
};

use crate::config::{ParseOptions, SchemaOptions};
use crate::context::{ParseContext, ParseMode, ParseResult, ParseReturn, SinkHandle};
use crate::error::{ParseError, SchemaError};
use crate::issue::ValidationError;
use crate::messages::{ErrorMap, Messages};
use crate::value::Value;
use futures::future::{BoxFuture, FutureExt, join_all};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, trace};

// =============================================================================
// Node Contract
// =============================================================================

/// Validation entry point of one kind of node.
pub(crate) trait Resolve {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a>;
}

/// Options shared by every node.
pub trait Configurable: Sized {
    fn options(&self) -> &SchemaOptions;

    fn options_mut(&mut self) -> &mut SchemaOptions;

    #[must_use = "This method returns a new schema and does not modify self"]
    fn with_options(mut self, options: SchemaOptions) -> Self {
        *self.options_mut() = options;
        self
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    fn describe(mut self, description: impl Into<String>) -> Self {
        self.options_mut().description = Some(description.into());
        self
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    fn with_error_map(mut self, error_map: ErrorMap) -> Self {
        self.options_mut().error_map = Some(error_map);
        self
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    fn with_messages(mut self, messages: Messages) -> Self {
        self.options_mut().messages = messages;
        self
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    fn invalid_type_message(mut self, message: impl Into<String>) -> Self {
        self.options_mut().messages.invalid_type = Some(message.into());
        self
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    fn required_message(mut self, message: impl Into<String>) -> Self {
        self.options_mut().messages.required = Some(message.into());
        self
    }

    /// Abort-early default for parses started at this node.
    #[must_use = "This method returns a new schema and does not modify self"]
    fn with_abort_early(mut self, abort_early: bool) -> Self {
        self.options_mut().abort_early = Some(abort_early);
        self
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    fn with_debug(mut self, debug: bool) -> Self {
        self.options_mut().debug = debug;
        self
    }

    fn description(&self) -> Option<&str> {
        self.options().description.as_deref()
    }
}

macro_rules! schema_kinds {
    ($($variant:ident($ty:ident) => $name:literal),* $(,)?) => {
        /// Every kind of schema node.
        #[derive(Clone)]
        pub enum SchemaKind {
            $($variant($ty),)*
        }

        impl SchemaKind {
            /// Lowercase kind name.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $name,)*
                }
            }

            pub fn options(&self) -> &SchemaOptions {
                match self {
                    $(Self::$variant(node) => &node.options,)*
                }
            }

            fn options_mut(&mut self) -> &mut SchemaOptions {
                match self {
                    $(Self::$variant(node) => &mut node.options,)*
                }
            }

            fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
                match self {
                    $(Self::$variant(node) => node.resolve(ctx),)*
                }
            }
        }

        $(
            impl From<$ty> for Schema {
                fn from(node: $ty) -> Self {
                    Schema::new(SchemaKind::$variant(node))
                }
            }

            impl Configurable for $ty {
                fn options(&self) -> &SchemaOptions {
                    &self.options
                }

                fn options_mut(&mut self) -> &mut SchemaOptions {
                    &mut self.options
                }
            }

            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($ty))
                        .field("options", &self.options)
                        .finish_non_exhaustive()
                }
            }
        )*
    };
}

schema_kinds! {
    String(StringSchema) => "string",
    Number(NumberSchema) => "number",
    BigInt(BigIntSchema) => "bigint",
    Boolean(BooleanSchema) => "boolean",
    Date(DateSchema) => "date",
    Symbol(SymbolSchema) => "symbol",
    Undefined(UndefinedSchema) => "undefined",
    Null(NullSchema) => "null",
    Void(VoidSchema) => "void",
    Any(AnySchema) => "any",
    Unknown(UnknownSchema) => "unknown",
    Never(NeverSchema) => "never",
    Nan(NanSchema) => "nan",
    Literal(LiteralSchema) => "literal",
    Enum(EnumSchema) => "enum",
    Optional(OptionalSchema) => "optional",
    Nullable(NullableSchema) => "nullable",
    Defined(DefinedSchema) => "defined",
    Default(DefaultSchema) => "default",
    Catch(CatchSchema) => "catch",
    Brand(BrandSchema) => "brand",
    Readonly(ReadonlySchema) => "readonly",
    Pipeline(PipelineSchema) => "pipeline",
    Lazy(LazySchema) => "lazy",
    Promise(PromiseSchema) => "promise",
    Effects(EffectsSchema) => "effects",
    Delete(DeleteSchema) => "delete",
    Object(ObjectSchema) => "object",
    Array(ArraySchema) => "array",
    Tuple(TupleSchema) => "tuple",
    Set(SetSchema) => "set",
    Record(RecordSchema) => "record",
    Union(UnionSchema) => "union",
    DiscriminatedUnion(DiscriminatedUnionSchema) => "discriminated_union",
    Intersection(IntersectionSchema) => "intersection",
}

// =============================================================================
// Schema Handle
// =============================================================================

/// A schema node. Cloning is cheap and shares the node.
#[derive(Clone)]
pub struct Schema {
    node: Arc<SchemaKind>,
}

impl Schema {
    fn new(kind: SchemaKind) -> Self {
        Self {
            node: Arc::new(kind),
        }
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.node
    }

    pub fn is_delete(&self) -> bool {
        matches!(*self.node, SchemaKind::Delete(_))
    }

    pub(crate) fn run<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        let node = &*self.node;
        if !(node.options().debug || ctx.debug()) {
            return node.resolve(ctx);
        }
        let kind = node.name();
        let path = ctx.path().clone();
        debug!(kind, path = %path, "Validating node");
        node.resolve(ctx).map(move |result| {
            debug!(kind, path = %path, valid = result.is_ok(), "Node validated");
            result
        })
    }

    /// Quiet synchronous check used by the manifest.
    pub(crate) fn accepts(&self, value: &Value) -> bool {
        self.execute(value.clone(), &ParseOptions::default()).is_ok()
    }

    fn execute(&self, input: Value, options: &ParseOptions) -> Result<Value, ParseError> {
        trace!(kind = self.kind().name(), mode = "sync", "Parse started");
        let ctx = ParseContext::root(input, ParseMode::Sync, options, self.options());
        let sink = ctx.sink();
        let root = ctx.fork();
        let result = root.settle(self.run(ctx));
        self.finish(result, &sink)
    }

    async fn execute_async(&self, input: Value, options: &ParseOptions) -> Result<Value, ParseError> {
        trace!(kind = self.kind().name(), mode = "async", "Parse started");
        let ctx = ParseContext::root(input, ParseMode::Async, options, self.options());
        let sink = ctx.sink();
        let result = self.run(ctx).into_future().await;
        self.finish(result, &sink)
    }

    fn finish(&self, result: ParseResult, sink: &SinkHandle) -> Result<Value, ParseError> {
        if let Some(usage) = sink.take_usage() {
            return Err(usage.into());
        }
        let issues = sink.take_issues();
        match result {
            Ok(value) if issues.is_empty() => Ok(value),
            _ => {
                debug!(
                    kind = self.kind().name(),
                    issues = issues.len(),
                    first_path = %issues.first().map(|i| i.path.to_string()).unwrap_or_default(),
                    "Parse failed"
                );
                Err(ValidationError::new(issues).into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Validation API
    // -------------------------------------------------------------------------

    /// Validate synchronously.
    ///
    /// # Errors
    ///
    /// [`ParseError::Validation`] when the input fails the schema,
    /// [`ParseError::Usage`] when the schema needs an asynchronous parse.
    pub fn parse(&self, input: impl Into<Value>) -> Result<Value, ParseError> {
        self.execute(input.into(), &ParseOptions::default())
    }

    pub fn parse_with(
        &self,
        input: impl Into<Value>,
        options: &ParseOptions,
    ) -> Result<Value, ParseError> {
        self.execute(input.into(), options)
    }

    /// Validate synchronously, returning the issues on failure.
    ///
    /// # Panics
    ///
    /// Panics if the schema contains asynchronous refinements, transforms or
    /// promises, which need [`safe_parse_async`](Self::safe_parse_async).
    pub fn safe_parse(&self, input: impl Into<Value>) -> Result<Value, ValidationError> {
        self.safe_parse_with(input, &ParseOptions::default())
    }

    /// See [`safe_parse`](Self::safe_parse).
    pub fn safe_parse_with(
        &self,
        input: impl Into<Value>,
        options: &ParseOptions,
    ) -> Result<Value, ValidationError> {
        match self.execute(input.into(), options) {
            Ok(value) => Ok(value),
            Err(ParseError::Validation(error)) => Err(error),
            Err(ParseError::Usage(error)) => panic!("{error}"),
        }
    }

    /// Validate, allowing asynchronous refinements, transforms and promises.
    pub async fn parse_async(&self, input: impl Into<Value>) -> Result<Value, ParseError> {
        self.execute_async(input.into(), &ParseOptions::default()).await
    }

    pub async fn parse_async_with(
        &self,
        input: impl Into<Value>,
        options: &ParseOptions,
    ) -> Result<Value, ParseError> {
        self.execute_async(input.into(), options).await
    }

    pub async fn safe_parse_async(&self, input: impl Into<Value>) -> Result<Value, ValidationError> {
        self.safe_parse_async_with(input, &ParseOptions::default()).await
    }

    pub async fn safe_parse_async_with(
        &self,
        input: impl Into<Value>,
        options: &ParseOptions,
    ) -> Result<Value, ValidationError> {
        match self.execute_async(input.into(), options).await {
            Ok(value) => Ok(value),
            Err(ParseError::Validation(error)) => Err(error),
            Err(ParseError::Usage(error)) => panic!("{error}"),
        }
    }

    /// True iff [`safe_parse`](Self::safe_parse) succeeds.
    pub fn guard(&self, input: impl Into<Value>) -> bool {
        self.safe_parse(input).is_ok()
    }

    pub fn guard_with(&self, input: impl Into<Value>, options: &ParseOptions) -> bool {
        self.safe_parse_with(input, options).is_ok()
    }
}

impl Configurable for Schema {
    fn options(&self) -> &SchemaOptions {
        self.node.options()
    }

    /// Copy-on-write: a shared node is cloned before it is changed.
    fn options_mut(&mut self) -> &mut SchemaOptions {
        Arc::make_mut(&mut self.node).options_mut()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("kind", &self.node.name())
            .field("options", self.node.options())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Composition
// =============================================================================

/// Wrappers and combinators available on every schema and builder.
pub trait SchemaExt: Into<Schema> + Sized {
    fn into_schema(self) -> Schema {
        self.into()
    }

    /// Accept `undefined`, yielding `undefined`.
    fn optional(self) -> Schema {
        OptionalSchema::new(self).into()
    }

    /// Accept `null`, yielding `null`.
    fn nullable(self) -> Schema {
        NullableSchema::new(self).into()
    }

    /// `nullable` then `optional`.
    fn nullish(self) -> Schema {
        self.nullable().optional()
    }

    /// Reject `undefined` with a `required` issue.
    fn defined(self) -> Schema {
        DefinedSchema::new(self).into()
    }

    /// Substitute a value for `undefined` input.
    fn default(self, value: impl Into<Value>) -> Schema {
        DefaultSchema::new(self, value).into()
    }

    /// Substitute a produced value for `undefined` input.
    fn default_with<F>(self, producer: F) -> Schema
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        DefaultSchema::with_producer(self, producer).into()
    }

    /// Substitute a value for any failed result.
    fn catch(self, value: impl Into<Value>) -> Schema {
        CatchSchema::new(self, value).into()
    }

    /// Substitute a produced value for any failed result.
    fn catch_with<F>(self, producer: F) -> Schema
    where
        F: Fn(&CatchContext) -> Value + Send + Sync + 'static,
    {
        CatchSchema::with_producer(self, producer).into()
    }

    /// Tag the schema. No runtime effect.
    fn brand(self, tag: impl Into<String>) -> Schema {
        BrandSchema::new(self, tag).into()
    }

    fn readonly(self) -> Schema {
        ReadonlySchema::new(self).into()
    }

    fn array(self) -> ArraySchema {
        ArraySchema::new(self)
    }

    fn promise(self) -> Schema {
        PromiseSchema::new(self).into()
    }

    fn or(self, other: impl Into<Schema>) -> Schema {
        UnionSchema::new([self.into(), other.into()]).into()
    }

    fn and(self, other: impl Into<Schema>) -> Schema {
        IntersectionSchema::new(self, other).into()
    }

    /// Feed this schema's output into `next`.
    fn pipe(self, next: impl Into<Schema>) -> Schema {
        PipelineSchema::new(self, next).into()
    }

    /// Fail with a `custom` issue when the predicate rejects the output.
    fn refine<F>(self, check: F, message: impl Into<String>) -> Schema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        EffectsSchema::new(self, Effect::refine(check, Some(message.into()))).into()
    }

    fn refine_async<F, Fut>(self, check: F, message: impl Into<String>) -> Schema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        EffectsSchema::new(self, Effect::refine_async(check, Some(message.into()))).into()
    }

    /// Run a refinement that can raise any number of issues.
    fn super_refine<F>(self, refinement: F) -> Schema
    where
        F: Fn(&Value, &mut RefinementContext) + Send + Sync + 'static,
    {
        EffectsSchema::new(self, Effect::super_refine(refinement)).into()
    }

    fn transform<F>(self, transform: F) -> Schema
    where
        F: Fn(Value, &mut RefinementContext) -> Value + Send + Sync + 'static,
    {
        EffectsSchema::new(self, Effect::transform(transform)).into()
    }

    fn transform_async<F, Fut>(self, transform: F) -> Schema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        EffectsSchema::new(self, Effect::transform_async(transform)).into()
    }
}

impl<T: Into<Schema>> SchemaExt for T {}

// =============================================================================
// Factories
// =============================================================================

pub fn string() -> StringSchema {
    StringSchema::new()
}

pub fn number() -> NumberSchema {
    NumberSchema::new()
}

pub fn bigint() -> BigIntSchema {
    BigIntSchema::new()
}

pub fn boolean() -> BooleanSchema {
    BooleanSchema::new()
}

pub fn date() -> DateSchema {
    DateSchema::new()
}

pub fn symbol() -> SymbolSchema {
    SymbolSchema::new()
}

pub fn undefined() -> UndefinedSchema {
    UndefinedSchema::new()
}

pub fn null() -> NullSchema {
    NullSchema::new()
}

pub fn void() -> VoidSchema {
    VoidSchema::new()
}

pub fn any() -> AnySchema {
    AnySchema::new()
}

pub fn unknown() -> UnknownSchema {
    UnknownSchema::new()
}

pub fn never() -> NeverSchema {
    NeverSchema::new()
}

pub fn nan() -> NanSchema {
    NanSchema::new()
}

pub fn literal(value: impl Into<Value>) -> LiteralSchema {
    LiteralSchema::new(value)
}

pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> EnumSchema {
    EnumSchema::new(values)
}

pub fn object(shape: Shape) -> ObjectSchema {
    ObjectSchema::new(shape)
}

pub fn array(element: impl Into<Schema>) -> ArraySchema {
    ArraySchema::new(element)
}

pub fn tuple<S: Into<Schema>>(items: impl IntoIterator<Item = S>) -> TupleSchema {
    TupleSchema::new(items)
}

pub fn set(element: impl Into<Schema>) -> SetSchema {
    SetSchema::new(element)
}

pub fn record(key: impl Into<Schema>, value: impl Into<Schema>) -> RecordSchema {
    RecordSchema::new(key, value)
}

pub fn union<S: Into<Schema>>(members: impl IntoIterator<Item = S>) -> UnionSchema {
    UnionSchema::new(members)
}

/// Union selecting its member by a tag field.
///
/// # Errors
///
/// Fails if a member has no literal or enum value for the tag, or two
/// members share a tag value.
pub fn discriminated_union(
    discriminator: impl Into<String>,
    members: impl IntoIterator<Item = ObjectSchema>,
) -> Result<DiscriminatedUnionSchema, SchemaError> {
    DiscriminatedUnionSchema::new(discriminator, members)
}

pub fn intersection(left: impl Into<Schema>, right: impl Into<Schema>) -> IntersectionSchema {
    IntersectionSchema::new(left, right)
}

pub fn optional(inner: impl Into<Schema>) -> OptionalSchema {
    OptionalSchema::new(inner)
}

pub fn nullable(inner: impl Into<Schema>) -> NullableSchema {
    NullableSchema::new(inner)
}

pub fn pipeline(input: impl Into<Schema>, output: impl Into<Schema>) -> PipelineSchema {
    PipelineSchema::new(input, output)
}

/// Recursive schemas. The factory runs on first use, not here.
pub fn lazy<F>(factory: F) -> LazySchema
where
    F: Fn() -> Schema + Send + Sync + 'static,
{
    LazySchema::new(factory)
}

pub fn promise(inner: impl Into<Schema>) -> PromiseSchema {
    PromiseSchema::new(inner)
}

/// Map the raw input before validating it.
pub fn preprocess<F>(preprocess: F, inner: impl Into<Schema>) -> EffectsSchema
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    EffectsSchema::new(inner, Effect::preprocess(preprocess))
}

/// Marker that drops its key from object output.
pub fn delete() -> DeleteSchema {
    DeleteSchema::new()
}

// =============================================================================
// Fan-out
// =============================================================================

/// Results of a composite's children, in job order.
pub(crate) enum Joined<'a> {
    Ready(Vec<ParseResult>),
    Pending(BoxFuture<'a, Vec<ParseResult>>),
}

impl<'a> Joined<'a> {
    pub(crate) fn finish<F>(self, finish: F) -> ParseReturn<'a>
    where
        F: FnOnce(Vec<ParseResult>) -> ParseResult + Send + 'a,
    {
        match self {
            Self::Ready(results) => ParseReturn::Ready(finish(results)),
            Self::Pending(fut) => ParseReturn::Pending(fut.map(finish).boxed()),
        }
    }
}

/// Validate children.
///
/// Synchronous parses run them in order and stop once the parse aborts, so
/// the result list may be shorter than `jobs`. Asynchronous parses start
/// every child before awaiting any and keep results in job order.
pub(crate) fn run_all<'a>(parent: &ParseContext, jobs: Vec<(&'a Schema, ParseContext)>) -> Joined<'a> {
    if parent.is_async() {
        let pending: Vec<_> = jobs
            .into_iter()
            .map(|(schema, ctx)| schema.run(ctx).into_future())
            .collect();
        return Joined::Pending(join_all(pending).boxed());
    }
    let mut results = Vec::with_capacity(jobs.len());
    for (schema, ctx) in jobs {
        if parent.should_abort() {
            break;
        }
        let handle = ctx.fork();
        results.push(handle.settle(schema.run(ctx)));
    }
    Joined::Ready(results)
}
