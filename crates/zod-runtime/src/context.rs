//! Parse context
//!
//! A [`ParseContext`] is handed to every schema node during a parse. It
//! carries the value under validation, the path to it, and a handle to the
//! issue sink shared by the whole call. Child contexts append one path segment
//! and share the sink; each context also remembers whether an issue was
//! recorded anywhere in its own subtree, which is what [`is_valid`] reports.
//!
//! Nodes answer with a [`ParseReturn`]: either a finished [`ParseResult`] or a
//! pending future. Synchronous parses treat a pending answer as caller misuse
//! and report a [`UsageError`] instead of waiting.
//!
//! [`is_valid`]: ParseContext::is_valid

use crate::config::{self, ParseOptions, SchemaOptions};
use crate::error::UsageError;
use crate::issue::{Issue, IssueKind};
use crate::messages::{self, ErrorMap};
use crate::path::{Path, PathSegment};
use crate::value::{Value, ValueType};
use futures::future::{self, BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{trace, warn};

/// Whether the current parse may suspend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Sync,
    Async,
}

/// Marker for a failed node. The reasons are in the issue sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalid;

/// Outcome of one node.
pub type ParseResult = Result<Value, Invalid>;

/// What a node returns: a finished result or one still being computed.
pub enum ParseReturn<'a> {
    Ready(ParseResult),
    Pending(BoxFuture<'a, ParseResult>),
}

impl<'a> ParseReturn<'a> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// The result, if it is available without waiting.
    pub fn now(self) -> Option<ParseResult> {
        match self {
            Self::Ready(result) => Some(result),
            Self::Pending(_) => None,
        }
    }

    pub fn into_future(self) -> BoxFuture<'a, ParseResult> {
        match self {
            Self::Ready(result) => future::ready(result).boxed(),
            Self::Pending(fut) => fut,
        }
    }

    /// Continue with another step once the result is known.
    pub fn and_then<F>(self, next: F) -> ParseReturn<'a>
    where
        F: FnOnce(ParseResult) -> ParseReturn<'a> + Send + 'a,
    {
        match self {
            Self::Ready(result) => next(result),
            Self::Pending(fut) => {
                Self::Pending(async move { next(fut.await).into_future().await }.boxed())
            }
        }
    }

    /// Transform the result once it is known.
    pub fn map<F>(self, f: F) -> ParseReturn<'a>
    where
        F: FnOnce(ParseResult) -> ParseResult + Send + 'a,
    {
        match self {
            Self::Ready(result) => Self::Ready(f(result)),
            Self::Pending(fut) => Self::Pending(fut.map(f).boxed()),
        }
    }
}

impl From<ParseResult> for ParseReturn<'_> {
    fn from(result: ParseResult) -> Self {
        Self::Ready(result)
    }
}

// =============================================================================
// Shared State
// =============================================================================

/// State of one parse call (or of one detached sub-parse).
struct Sink {
    mode: ParseMode,
    abort_early: bool,
    debug: bool,
    max_issues: usize,
    error_map: Option<ErrorMap>,
    issues: Mutex<Vec<Issue>>,
    aborted: AtomicBool,
    truncated: AtomicBool,
    usage: Mutex<Option<UsageError>>,
}

impl Sink {
    fn issues(&self) -> MutexGuard<'_, Vec<Issue>> {
        self.issues.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn usage(&self) -> MutexGuard<'_, Option<UsageError>> {
        self.usage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Validity of one context subtree.
struct Scope {
    parent: Option<Arc<Scope>>,
    dirty: AtomicBool,
}

impl Scope {
    fn root() -> Arc<Self> {
        Arc::new(Self {
            parent: None,
            dirty: AtomicBool::new(false),
        })
    }

    fn child(self: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            parent: Some(Arc::clone(self)),
            dirty: AtomicBool::new(false),
        })
    }

    fn mark(&self) {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if current.dirty.swap(true, Ordering::AcqRel) {
                break;
            }
            scope = current.parent.as_deref();
        }
    }
}

/// Read access to a sink after the contexts using it are gone.
pub(crate) struct SinkHandle(Arc<Sink>);

impl SinkHandle {
    pub(crate) fn take_issues(&self) -> Vec<Issue> {
        std::mem::take(&mut *self.0.issues())
    }

    pub(crate) fn take_usage(&self) -> Option<UsageError> {
        self.0.usage().take()
    }
}

// =============================================================================
// Context
// =============================================================================

/// Per-node view of a parse call.
pub struct ParseContext {
    sink: Arc<Sink>,
    scope: Arc<Scope>,
    path: Path,
    data: Value,
}

impl ParseContext {
    /// Root context of a parse call.
    pub(crate) fn root(
        data: Value,
        mode: ParseMode,
        options: &ParseOptions,
        root_options: &SchemaOptions,
    ) -> Self {
        let engine = config::global();
        let sink = Sink {
            mode,
            abort_early: options
                .abort_early
                .or(root_options.abort_early)
                .unwrap_or(engine.abort_early),
            debug: engine.debug,
            max_issues: engine.max_issues,
            error_map: options.error_map.clone(),
            issues: Mutex::new(Vec::new()),
            aborted: AtomicBool::new(false),
            truncated: AtomicBool::new(false),
            usage: Mutex::new(None),
        };
        Self {
            sink: Arc::new(sink),
            scope: Scope::root(),
            path: options.path.clone(),
            data,
        }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Replace the value under validation.
    pub fn set_data(&mut self, data: Value) {
        self.data = data;
    }

    /// Move the value out, leaving `undefined`.
    pub fn take_data(&mut self) -> Value {
        std::mem::take(&mut self.data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> ParseMode {
        self.sink.mode
    }

    pub fn is_async(&self) -> bool {
        self.sink.mode == ParseMode::Async
    }

    pub fn abort_early(&self) -> bool {
        self.sink.abort_early
    }

    pub(crate) fn debug(&self) -> bool {
        self.sink.debug
    }

    /// Context for a nested value. Shares the sink.
    pub fn child(&self, segment: impl Into<PathSegment>, data: Value) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            scope: self.scope.child(),
            path: self.path.child(segment),
            data,
        }
    }

    /// Context for another value at the same path, in its own sub-scope.
    pub fn with_data(&self, data: Value) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            scope: self.scope.child(),
            path: self.path.clone(),
            data,
        }
    }

    /// A second handle on this node, without data.
    pub(crate) fn fork(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            scope: Arc::clone(&self.scope),
            path: self.path.clone(),
            data: Value::Undefined,
        }
    }

    /// Context with a fresh, isolated sink at the same path.
    ///
    /// Issues recorded through it do not reach this parse; read them back
    /// through [`SinkHandle`].
    pub(crate) fn detached(&self, data: Value) -> (Self, SinkHandle) {
        let sink = Arc::new(Sink {
            mode: self.sink.mode,
            abort_early: self.sink.abort_early,
            debug: self.sink.debug,
            max_issues: self.sink.max_issues,
            error_map: self.sink.error_map.clone(),
            issues: Mutex::new(Vec::new()),
            aborted: AtomicBool::new(false),
            truncated: AtomicBool::new(false),
            usage: Mutex::new(None),
        });
        let ctx = Self {
            sink: Arc::clone(&sink),
            scope: Scope::root(),
            path: self.path.clone(),
            data,
        };
        (ctx, SinkHandle(sink))
    }

    pub(crate) fn sink(&self) -> SinkHandle {
        SinkHandle(Arc::clone(&self.sink))
    }

    /// True iff no issue was recorded in this context's subtree.
    pub fn is_valid(&self) -> bool {
        !self.scope.dirty.load(Ordering::Acquire)
    }

    /// True once an abort-early parse has recorded its first issue, or a
    /// usage error stopped the parse.
    pub fn should_abort(&self) -> bool {
        self.sink.aborted.load(Ordering::Acquire)
    }

    /// Record an issue at this context's path.
    pub fn add_issue(&self, options: &SchemaOptions, kind: IssueKind, message: Option<&str>) -> &Self {
        self.record(options, kind, message, self.path.clone());
        self
    }

    /// Record an issue below this context's path.
    pub fn add_issue_at(
        &self,
        options: &SchemaOptions,
        suffix: &Path,
        kind: IssueKind,
        message: Option<&str>,
    ) -> &Self {
        self.record(options, kind, message, self.path.join(suffix));
        self
    }

    /// Record a type mismatch against the current data.
    pub fn invalid_type(&self, options: &SchemaOptions, expected: ValueType) -> &Self {
        let kind = IssueKind::InvalidType {
            expected,
            received: self.data.value_type(),
        };
        self.add_issue(options, kind, None)
    }

    fn record(&self, options: &SchemaOptions, kind: IssueKind, message: Option<&str>, path: Path) {
        self.scope.mark();
        if self.should_abort() {
            return;
        }
        let mut issues = self.sink.issues();
        if issues.len() >= self.sink.max_issues {
            if !self.sink.truncated.swap(true, Ordering::AcqRel) {
                warn!(
                    max_issues = self.sink.max_issues,
                    code = kind.code(),
                    path = %path,
                    "Issue limit reached, dropping further issues"
                );
            }
            return;
        }
        let message = messages::resolve(
            &kind,
            message,
            self.sink.error_map.as_ref(),
            options,
            &self.data,
            &path,
        );
        trace!(code = kind.code(), path = %path, "Issue recorded");
        issues.push(Issue::new(kind, path, message));
        if self.sink.abort_early {
            self.sink.aborted.store(true, Ordering::Release);
        }
    }

    pub fn success(&self, value: Value) -> ParseResult {
        Ok(value)
    }

    /// Mark this context invalid and fail.
    pub fn abort(&self) -> ParseResult {
        self.scope.mark();
        Err(Invalid)
    }

    /// `Ok(value)` if the subtree is valid, otherwise a failure.
    pub fn result(&self, value: Value) -> ParseResult {
        if self.is_valid() {
            Ok(value)
        } else {
            Err(Invalid)
        }
    }

    /// Stop the parse with a usage error. The first one wins.
    pub(crate) fn usage_error(&self, error: UsageError) -> ParseResult {
        warn!(error = %error, "Schema misuse");
        {
            let mut slot = self.sink.usage();
            if slot.is_none() {
                *slot = Some(error);
            }
        }
        self.sink.aborted.store(true, Ordering::Release);
        self.abort()
    }

    /// A node produced a pending result during a synchronous parse.
    pub(crate) fn async_in_sync(&self) -> ParseResult {
        self.usage_error(UsageError::AsyncInSyncParse {
            path: self.path.clone(),
        })
    }

    /// Re-raise a usage error captured by a detached sink.
    pub(crate) fn forward_usage(&self, sink: &SinkHandle) -> Option<ParseResult> {
        sink.take_usage().map(|error| self.usage_error(error))
    }

    /// Finish a node's result synchronously, reporting misuse if it is
    /// still pending.
    pub(crate) fn settle(&self, ret: ParseReturn<'_>) -> ParseResult {
        match ret.now() {
            Some(result) => result,
            None => self.async_in_sync(),
        }
    }
}
