//! Single-child wrappers
//!
//! Each wrapper changes how its child is invoked and otherwise defers to it.

use super::{Resolve, Schema};
use crate::config::SchemaOptions;
use crate::context::{ParseContext, ParseReturn};
use crate::error::UsageError;
use crate::issue::{IssueKind, ValidationError};
use crate::value::{Value, ValueType};
use futures::future::FutureExt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

// =============================================================================
// Optional / Nullable / Defined
// =============================================================================

/// Accepts `undefined` without consulting the child.
#[derive(Clone)]
pub struct OptionalSchema {
    pub(crate) options: SchemaOptions,
    inner: Schema,
}

impl OptionalSchema {
    pub fn new(inner: impl Into<Schema>) -> Self {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
        }
    }

    pub fn inner(&self) -> &Schema {
        &self.inner
    }
}

impl Resolve for OptionalSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        if ctx.data().is_undefined() {
            return ParseReturn::Ready(Ok(Value::Undefined));
        }
        self.inner.run(ctx)
    }
}

/// Accepts `null` without consulting the child.
#[derive(Clone)]
pub struct NullableSchema {
    pub(crate) options: SchemaOptions,
    inner: Schema,
}

impl NullableSchema {
    pub fn new(inner: impl Into<Schema>) -> Self {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
        }
    }

    pub fn inner(&self) -> &Schema {
        &self.inner
    }
}

impl Resolve for NullableSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        if ctx.data().is_null() {
            return ParseReturn::Ready(Ok(Value::Null));
        }
        self.inner.run(ctx)
    }
}

/// Rejects `undefined` with a `required` issue.
#[derive(Clone)]
pub struct DefinedSchema {
    pub(crate) options: SchemaOptions,
    inner: Schema,
}

impl DefinedSchema {
    pub fn new(inner: impl Into<Schema>) -> Self {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
        }
    }

    pub fn inner(&self) -> &Schema {
        &self.inner
    }
}

impl Resolve for DefinedSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        if ctx.data().is_undefined() {
            ctx.add_issue(&self.options, IssueKind::Required, None);
            return ctx.abort().into();
        }
        self.inner.run(ctx)
    }
}

// =============================================================================
// Default / Catch
// =============================================================================

#[derive(Clone)]
enum DefaultSource {
    Value(Value),
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

/// Substitutes a value for `undefined` input, then runs the child on it.
#[derive(Clone)]
pub struct DefaultSchema {
    pub(crate) options: SchemaOptions,
    inner: Schema,
    source: DefaultSource,
}

impl DefaultSchema {
    pub fn new(inner: impl Into<Schema>, value: impl Into<Value>) -> Self {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
            source: DefaultSource::Value(value.into()),
        }
    }

    /// The producer runs once per defaulted parse.
    pub fn with_producer<F>(inner: impl Into<Schema>, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
            source: DefaultSource::Producer(Arc::new(producer)),
        }
    }

    pub fn inner(&self) -> &Schema {
        &self.inner
    }

    pub fn default_value(&self) -> Value {
        match &self.source {
            DefaultSource::Value(value) => value.clone(),
            DefaultSource::Producer(producer) => producer(),
        }
    }
}

impl Resolve for DefaultSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        if ctx.data().is_undefined() {
            trace!(path = %ctx.path(), "Applying default");
            ctx.set_data(self.default_value());
        }
        self.inner.run(ctx)
    }
}

/// What a catch producer gets to work with.
#[derive(Debug, Clone)]
pub struct CatchContext {
    /// The input the child rejected
    pub input: Value,
    /// The issues the child raised
    pub error: ValidationError,
}

#[derive(Clone)]
enum CatchSource {
    Value(Value),
    Producer(Arc<dyn Fn(&CatchContext) -> Value + Send + Sync>),
}

/// Substitutes a value for any failed result of the child.
///
/// The child runs against an isolated issue sink, so its issues never reach
/// the caller. Usage errors still do.
#[derive(Clone)]
pub struct CatchSchema {
    pub(crate) options: SchemaOptions,
    inner: Schema,
    source: CatchSource,
}

impl CatchSchema {
    pub fn new(inner: impl Into<Schema>, value: impl Into<Value>) -> Self {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
            source: CatchSource::Value(value.into()),
        }
    }

    pub fn with_producer<F>(inner: impl Into<Schema>, producer: F) -> Self
    where
        F: Fn(&CatchContext) -> Value + Send + Sync + 'static,
    {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
            source: CatchSource::Producer(Arc::new(producer)),
        }
    }

    pub fn inner(&self) -> &Schema {
        &self.inner
    }

    fn fallback(&self, caught: &CatchContext) -> Value {
        match &self.source {
            CatchSource::Value(value) => value.clone(),
            CatchSource::Producer(producer) => producer(caught),
        }
    }
}

impl Resolve for CatchSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        let input = ctx.take_data();
        let (attempt, sink) = ctx.detached(input.clone());
        self.inner.run(attempt).and_then(move |result| {
            if let Some(usage) = ctx.forward_usage(&sink) {
                return usage.into();
            }
            let issues = sink.take_issues();
            match result {
                Ok(value) if issues.is_empty() => ParseReturn::Ready(Ok(value)),
                _ => {
                    trace!(path = %ctx.path(), issues = issues.len(), "Catching failure");
                    let caught = CatchContext {
                        input,
                        error: ValidationError::new(issues),
                    };
                    ParseReturn::Ready(Ok(self.fallback(&caught)))
                }
            }
        })
    }
}

// =============================================================================
// Brand / Readonly
// =============================================================================

/// Tags a schema. Validation is the child's.
#[derive(Clone)]
pub struct BrandSchema {
    pub(crate) options: SchemaOptions,
    inner: Schema,
    brand: String,
}

impl BrandSchema {
    pub fn new(inner: impl Into<Schema>, brand: impl Into<String>) -> Self {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
            brand: brand.into(),
        }
    }

    pub fn inner(&self) -> &Schema {
        &self.inner
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }
}

impl Resolve for BrandSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        self.inner.run(ctx)
    }
}

/// Marks the output read-only. Validation is the child's.
#[derive(Clone)]
pub struct ReadonlySchema {
    pub(crate) options: SchemaOptions,
    inner: Schema,
}

impl ReadonlySchema {
    pub fn new(inner: impl Into<Schema>) -> Self {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
        }
    }

    pub fn inner(&self) -> &Schema {
        &self.inner
    }
}

impl Resolve for ReadonlySchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        self.inner.run(ctx)
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Two schemas in sequence: the output of `input` is the input of `output`.
#[derive(Clone)]
pub struct PipelineSchema {
    pub(crate) options: SchemaOptions,
    input: Schema,
    output: Schema,
}

impl PipelineSchema {
    pub fn new(input: impl Into<Schema>, output: impl Into<Schema>) -> Self {
        Self {
            options: SchemaOptions::default(),
            input: input.into(),
            output: output.into(),
        }
    }

    pub fn input(&self) -> &Schema {
        &self.input
    }

    pub fn output(&self) -> &Schema {
        &self.output
    }
}

impl Resolve for PipelineSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        let data = ctx.take_data();
        let first = ctx.with_data(data);
        self.input.run(first).and_then(move |result| match result {
            Ok(value) => self.output.run(ctx.with_data(value)),
            Err(invalid) => ParseReturn::Ready(Err(invalid)),
        })
    }
}

// =============================================================================
// Lazy
// =============================================================================

/// A child built on first use, for recursive schemas.
#[derive(Clone)]
pub struct LazySchema {
    pub(crate) options: SchemaOptions,
    factory: Arc<dyn Fn() -> Schema + Send + Sync>,
    cached: Arc<OnceLock<Schema>>,
}

impl LazySchema {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Schema + Send + Sync + 'static,
    {
        Self {
            options: SchemaOptions::default(),
            factory: Arc::new(factory),
            cached: Arc::new(OnceLock::new()),
        }
    }

    /// The child, building it if needed. Clones share the built child.
    pub fn schema(&self) -> &Schema {
        self.cached.get_or_init(|| (self.factory)())
    }
}

impl Resolve for LazySchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        self.schema().run(ctx)
    }
}

// =============================================================================
// Promise
// =============================================================================

/// A promise whose resolved value must match the child.
///
/// Only asynchronous parses can wait for the promise; a synchronous parse
/// reports a usage error.
#[derive(Clone)]
pub struct PromiseSchema {
    pub(crate) options: SchemaOptions,
    inner: Schema,
}

impl PromiseSchema {
    pub fn new(inner: impl Into<Schema>) -> Self {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
        }
    }

    pub fn inner(&self) -> &Schema {
        &self.inner
    }
}

impl Resolve for PromiseSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        let Value::Promise(promise) = ctx.data() else {
            ctx.invalid_type(&self.options, ValueType::Promise);
            return ctx.abort().into();
        };
        if !ctx.is_async() {
            let error = UsageError::PromiseInSyncParse {
                path: ctx.path().clone(),
            };
            return ctx.usage_error(error).into();
        }
        let pending = promise.resolve();
        ParseReturn::Pending(
            async move {
                let resolved = pending.await;
                self.inner.run(ctx.with_data(resolved)).into_future().await
            }
            .boxed(),
        )
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Object-shape marker: the key is dropped from the output.
///
/// Outside an object shape it accepts anything and yields `undefined`.
#[derive(Clone, Default)]
pub struct DeleteSchema {
    pub(crate) options: SchemaOptions,
}

impl DeleteSchema {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Resolve for DeleteSchema {
    fn resolve<'a>(&'a self, _ctx: ParseContext) -> ParseReturn<'a> {
        ParseReturn::Ready(Ok(Value::Undefined))
    }
}
