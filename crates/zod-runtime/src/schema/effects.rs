//! Refinements, transforms and preprocessing
//!
//! An [`EffectsSchema`] runs one [`Effect`] around its child. Refinements and
//! transforms see the child's output and only run when the child succeeded;
//! a preprocess step rewrites the raw input before the child sees it.
//!
//! # Example
//!
//! ```rust,ignore
//! use zod_runtime::prelude::*;
//!
//! let password = string()
//!     .min(8)
//!     .super_refine(|value, ctx| {
//!         let text = value.as_str().unwrap_or_default();
//!         if !text.chars().any(|c| c.is_ascii_digit()) {
//!             ctx.custom("Password must contain a digit");
//!         }
//!     });
//! ```

use super::{Resolve, Schema};
use crate::config::SchemaOptions;
use crate::context::{ParseContext, ParseReturn};
use crate::issue::IssueKind;
use crate::path::Path;
use crate::value::Value;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type RefineFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type AsyncRefineFn = Arc<dyn Fn(Value) -> BoxFuture<'static, bool> + Send + Sync>;
type SuperRefineFn = Arc<dyn Fn(&Value, &mut RefinementContext) + Send + Sync>;
type TransformFn = Arc<dyn Fn(Value, &mut RefinementContext) -> Value + Send + Sync>;
type AsyncTransformFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Value> + Send + Sync>;
type PreprocessFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// One user-supplied step.
#[derive(Clone)]
pub enum Effect {
    Refine {
        check: RefineFn,
        message: Option<String>,
    },
    RefineAsync {
        check: AsyncRefineFn,
        message: Option<String>,
    },
    SuperRefine(SuperRefineFn),
    Transform(TransformFn),
    TransformAsync(AsyncTransformFn),
    Preprocess(PreprocessFn),
}

impl Effect {
    pub fn refine<F>(check: F, message: Option<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Refine {
            check: Arc::new(check),
            message,
        }
    }

    pub fn refine_async<F, Fut>(check: F, message: Option<String>) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::RefineAsync {
            check: Arc::new(move |value| check(value).boxed()),
            message,
        }
    }

    pub fn super_refine<F>(refinement: F) -> Self
    where
        F: Fn(&Value, &mut RefinementContext) + Send + Sync + 'static,
    {
        Self::SuperRefine(Arc::new(refinement))
    }

    pub fn transform<F>(transform: F) -> Self
    where
        F: Fn(Value, &mut RefinementContext) -> Value + Send + Sync + 'static,
    {
        Self::Transform(Arc::new(transform))
    }

    pub fn transform_async<F, Fut>(transform: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        Self::TransformAsync(Arc::new(move |value| transform(value).boxed()))
    }

    pub fn preprocess<F>(preprocess: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::Preprocess(Arc::new(preprocess))
    }

    /// `refinement`, `transform` or `preprocess`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Refine { .. } | Self::RefineAsync { .. } | Self::SuperRefine(_) => "refinement",
            Self::Transform(_) | Self::TransformAsync(_) => "transform",
            Self::Preprocess(_) => "preprocess",
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::RefineAsync { .. } | Self::TransformAsync(_))
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("kind", &self.kind())
            .field("async", &self.is_async())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Refinement Context
// =============================================================================

/// Issue collector handed to `super_refine` and `transform` callbacks.
#[derive(Debug)]
pub struct RefinementContext {
    path: Path,
    issues: Vec<(Path, IssueKind, Option<String>)>,
}

impl RefinementContext {
    fn new(path: Path) -> Self {
        Self {
            path,
            issues: Vec::new(),
        }
    }

    /// Path of the value being refined.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raise an issue at the refined value.
    pub fn add_issue(&mut self, kind: IssueKind, message: Option<String>) {
        self.issues.push((Path::root(), kind, message));
    }

    /// Raise an issue below the refined value.
    pub fn add_issue_at(&mut self, suffix: Path, kind: IssueKind, message: Option<String>) {
        self.issues.push((suffix, kind, message));
    }

    /// Raise a `custom` issue with a message.
    pub fn custom(&mut self, message: impl Into<String>) {
        self.add_issue(IssueKind::custom(), Some(message.into()));
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Record the collected issues. Returns true if there were none.
    fn flush(self, ctx: &ParseContext, options: &SchemaOptions) -> bool {
        let clean = self.issues.is_empty();
        for (suffix, kind, message) in self.issues {
            ctx.add_issue_at(options, &suffix, kind, message.as_deref());
        }
        clean
    }
}

// =============================================================================
// Effects Node
// =============================================================================

/// A child schema plus one effect.
#[derive(Clone)]
pub struct EffectsSchema {
    pub(crate) options: SchemaOptions,
    inner: Schema,
    effect: Effect,
}

impl EffectsSchema {
    pub fn new(inner: impl Into<Schema>, effect: Effect) -> Self {
        Self {
            options: SchemaOptions::default(),
            inner: inner.into(),
            effect,
        }
    }

    pub fn inner(&self) -> &Schema {
        &self.inner
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    fn apply<'a>(&'a self, ctx: ParseContext, value: Value) -> ParseReturn<'a> {
        match &self.effect {
            Effect::Refine { check, message } => {
                if check(&value) {
                    return ParseReturn::Ready(Ok(value));
                }
                ctx.add_issue(&self.options, IssueKind::custom(), message.as_deref());
                ctx.abort().into()
            }
            Effect::RefineAsync { check, message } => {
                if !ctx.is_async() {
                    return ctx.async_in_sync().into();
                }
                let pending = check(value.clone());
                ParseReturn::Pending(
                    async move {
                        if pending.await {
                            return Ok(value);
                        }
                        ctx.add_issue(&self.options, IssueKind::custom(), message.as_deref());
                        ctx.abort()
                    }
                    .boxed(),
                )
            }
            Effect::SuperRefine(refinement) => {
                let mut refinement_ctx = RefinementContext::new(ctx.path().clone());
                refinement(&value, &mut refinement_ctx);
                if refinement_ctx.flush(&ctx, &self.options) {
                    ParseReturn::Ready(Ok(value))
                } else {
                    ctx.abort().into()
                }
            }
            Effect::Transform(transform) => {
                let mut refinement_ctx = RefinementContext::new(ctx.path().clone());
                let output = transform(value, &mut refinement_ctx);
                if refinement_ctx.flush(&ctx, &self.options) {
                    ParseReturn::Ready(Ok(output))
                } else {
                    ctx.abort().into()
                }
            }
            Effect::TransformAsync(transform) => {
                if !ctx.is_async() {
                    return ctx.async_in_sync().into();
                }
                ParseReturn::Pending(transform(value).map(Ok).boxed())
            }
            Effect::Preprocess(_) => ParseReturn::Ready(Ok(value)),
        }
    }
}

impl Resolve for EffectsSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        if let Effect::Preprocess(preprocess) = &self.effect {
            let data = preprocess(ctx.take_data());
            ctx.set_data(data);
            return self.inner.run(ctx);
        }
        let data = ctx.take_data();
        let inner = ctx.with_data(data);
        self.inner.run(inner).and_then(move |result| match result {
            Ok(value) => self.apply(ctx, value),
            Err(invalid) => ParseReturn::Ready(Err(invalid)),
        })
    }
}
