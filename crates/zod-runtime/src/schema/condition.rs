//! Conditional object shapes
//!
//! A [`When`] inspects one value of the input by path and picks a branch that
//! rewrites the object definition before any key is validated. Branches work
//! on a copy; the declared schema is never changed.
//!
//! ```rust,ignore
//! let payment = object(
//!     Shape::new()
//!         .field("method", enumeration(["card", "transfer"]))
//!         .field("card_number", string().optional()),
//! )
//! .when(
//!     When::new("method", Predicate::equals("card"))?
//!         .then(|schema| schema.extend(Shape::new().field("card_number", string().length(16)))),
//! );
//! ```

use super::{ObjectSchema, Schema};
use crate::context::{ParseContext, ParseReturn};
use crate::error::{ParseError, SchemaError, UsageError};
use crate::path::Path;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Rewrites an object definition.
pub type Branch = Arc<dyn Fn(ObjectSchema) -> ObjectSchema + Send + Sync>;

/// Test applied to the value at a condition's path. A missing value is
/// tested as `undefined`.
#[derive(Clone)]
pub enum Predicate {
    Equals(Value),
    /// The value passes the schema.
    Matches(Schema),
    Func(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
    /// The value is present and not `undefined`.
    Exists,
}

impl Predicate {
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Equals(value.into())
    }

    pub fn matches(schema: impl Into<Schema>) -> Self {
        Self::Matches(schema.into())
    }

    pub fn func<F>(test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Func(Arc::new(test))
    }

    pub fn exists() -> Self {
        Self::Exists
    }

    /// Test a value outside of any parse.
    ///
    /// # Errors
    ///
    /// Returns the [`UsageError`] raised when a [`Matches`](Self::Matches)
    /// schema needs an asynchronous parse.
    pub fn test(&self, value: Option<&Value>) -> Result<bool, UsageError> {
        let value = value.unwrap_or(&Value::Undefined);
        match self {
            Self::Matches(schema) => match schema.parse(value.clone()) {
                Ok(_) => Ok(true),
                Err(ParseError::Validation(_)) => Ok(false),
                Err(ParseError::Usage(error)) => Err(error),
            },
            _ => Ok(self.test_value(value).unwrap_or_default()),
        }
    }

    /// Outcome for predicates that need no parse; `None` for schemas.
    fn test_value(&self, value: &Value) -> Option<bool> {
        match self {
            Self::Equals(expected) => Some(value == expected),
            Self::Matches(_) => None,
            Self::Func(test) => Some(test(value)),
            Self::Exists => Some(!value.is_undefined()),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(value) => f.debug_tuple("Equals").field(value).finish(),
            Self::Matches(schema) => f.debug_tuple("Matches").field(schema).finish(),
            Self::Func(_) => f.write_str("Func"),
            Self::Exists => f.write_str("Exists"),
        }
    }
}

/// A conditional rewrite of an object definition.
#[derive(Clone)]
pub struct When {
    path: Path,
    predicate: Predicate,
    then: Option<Branch>,
    otherwise: Option<Branch>,
}

impl When {
    /// Condition on the value at a dot/bracket path such as `address.country`
    /// or `items[0].kind`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidPath`] when the path does not parse.
    pub fn new(path: &str, predicate: Predicate) -> Result<Self, SchemaError> {
        Ok(Self::at(Path::parse(path)?, predicate))
    }

    pub fn at(path: Path, predicate: Predicate) -> Self {
        Self {
            path,
            predicate,
            then: None,
            otherwise: None,
        }
    }

    /// Branch taken when the predicate holds.
    #[must_use = "This method returns a new When and does not modify self"]
    pub fn then<F>(mut self, branch: F) -> Self
    where
        F: Fn(ObjectSchema) -> ObjectSchema + Send + Sync + 'static,
    {
        self.then = Some(Arc::new(branch));
        self
    }

    /// Branch taken when the predicate does not hold.
    #[must_use = "This method returns a new When and does not modify self"]
    pub fn otherwise<F>(mut self, branch: F) -> Self
    where
        F: Fn(ObjectSchema) -> ObjectSchema + Send + Sync + 'static,
    {
        self.otherwise = Some(Arc::new(branch));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Whether the predicate holds for `data`, outside of any parse.
    ///
    /// # Errors
    ///
    /// See [`Predicate::test`].
    pub fn holds(&self, data: &Value) -> Result<bool, UsageError> {
        self.predicate.test(data.get_path(&self.path))
    }

    /// Test the predicate against the object under `ctx`, in the parse's
    /// mode. Answers `Value::Bool`. A schema predicate runs on an isolated
    /// sink: its issues never reach the parse, its usage errors do.
    pub(crate) fn evaluate<'a>(&'a self, ctx: &ParseContext) -> ParseReturn<'a> {
        let value = ctx.data().get_path(&self.path).cloned().unwrap_or_default();
        let Predicate::Matches(schema) = &self.predicate else {
            let holds = self.predicate.test_value(&value).unwrap_or_default();
            return ParseReturn::Ready(Ok(Value::Bool(holds)));
        };
        let (attempt, sink) = ctx.detached(value);
        let parent = ctx.fork();
        schema.run(attempt).map(move |result| {
            if let Some(usage) = parent.forward_usage(&sink) {
                return usage;
            }
            let passed = result.is_ok() && sink.take_issues().is_empty();
            Ok(Value::Bool(passed))
        })
    }
}

impl fmt::Debug for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("When")
            .field("path", &self.path)
            .field("predicate", &self.predicate)
            .field("then", &self.then.is_some())
            .field("otherwise", &self.otherwise.is_some())
            .finish()
    }
}

/// The definition `schema` takes given the outcome of each condition, in
/// declaration order.
pub(crate) fn apply(schema: &ObjectSchema, outcomes: &[bool]) -> ObjectSchema {
    let mut rewritten = schema.clone();
    rewritten.conditions.clear();
    for (condition, &holds) in schema.conditions.iter().zip(outcomes) {
        trace!(path = %condition.path, holds, "Condition evaluated");
        let branch = if holds {
            &condition.then
        } else {
            &condition.otherwise
        };
        if let Some(branch) = branch {
            rewritten = branch(rewritten);
        }
    }
    rewritten.conditions.clear();
    rewritten
}
