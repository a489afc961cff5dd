//! # zod-runtime
//!
//! Composable schema validation and transformation for dynamic values.
//!
//! ## Overview
//!
//! Build a tree of schema nodes describing the data you expect, then feed
//! untyped input through it. A parse returns either the validated (and
//! possibly transformed) value, or every issue found, each with a path into
//! the input.
//!
//! - **Primitives**: string, number, bigint, boolean, date, literal, enum, ...
//!   with per-type checks (`min`, `email`, `int`, `multiple_of`, ...)
//! - **Wrappers**: optional, nullable, default, catch, brand, pipeline, lazy
//! - **Composites**: objects with unknown-key policies, conditional shapes
//!   and construction-time references; arrays, tuples, sets, records;
//!   unions, discriminated unions and intersections
//! - **Effects**: refinements and transforms, synchronous or asynchronous
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   parse()    ┌──────────────┐   run(ctx)   ┌──────────────┐
//! │    Caller    │ ───────────▶ │    Schema    │ ───────────▶ │  SchemaKind  │
//! └──────────────┘              └──────┬───────┘              └──────┬───────┘
//!                                      │ root context                │ child contexts
//!                                      ▼                             ▼
//!                               ┌──────────────┐              ┌──────────────┐
//!                               │  Issue sink  │ ◀─────────── │ ParseContext │
//!                               └──────────────┘  add_issue   └──────────────┘
//! ```
//!
//! Every node answers with a [`ParseReturn`]: ready, or pending when an
//! asynchronous refinement, transform or promise is involved. Synchronous
//! parses report a pending node as a [`UsageError`] instead of waiting.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use zod_runtime::prelude::*;
//! use serde_json::json;
//!
//! let user: Schema = object(
//!     Shape::new()
//!         .field("email", string().email())
//!         .field("age", number().int().gte(18.0))
//!         .field("role", enumeration(["admin", "user"]).default("user")),
//! )
//! .into();
//!
//! let parsed = user.parse(json!({ "email": "ada@example.com", "age": 36 }))?;
//! assert_eq!(parsed.get("role"), Some(&Value::from("user")));
//!
//! let error = user.safe_parse(json!({ "email": "nope", "age": 12.5 })).unwrap_err();
//! for issue in error.issues() {
//!     println!("{}: {}", issue.path, issue.message);
//! }
//! ```
//!
//! ## Configuration
//!
//! Per-call options go in [`ParseOptions`], per-node options in
//! [`SchemaOptions`]. Process-wide defaults can be installed once with
//! [`config::install`].

pub mod checks;
pub mod config;
mod context;
mod error;
mod issue;
pub mod manifest;
pub mod messages;
pub mod path;
pub mod schema;
pub mod value;

#[cfg(test)]
mod tests;

pub use checks::{Check, CheckList, Rule};
pub use config::{EngineConfig, ParseOptions, SchemaOptions};
pub use context::{Invalid, ParseContext, ParseMode, ParseResult, ParseReturn};
pub use error::{ConfigError, ParseError, SchemaError, UsageError};
pub use issue::{
    Bound, FlattenedError, Issue, IssueKind, SizeOrigin, StringFormat, ValidationError,
};
pub use manifest::Manifest;
pub use messages::{ErrorMap, ErrorMapContext, Messages, error_map};
pub use path::{Path, PathParseError, PathSegment};
pub use schema::{Configurable, Schema, SchemaExt, SchemaKind};
pub use value::{ObjectMap, Promise, Symbol, Value, ValueType};

/// Prelude for convenient imports
///
/// ```rust,ignore
/// use zod_runtime::prelude::*;
/// ```
pub mod prelude {
    pub use crate::schema::{
        Predicate, Shape, When, any, array, bigint, boolean, date, delete, discriminated_union,
        enumeration, intersection, lazy, literal, nan, never, null, nullable, number, object,
        optional, pipeline, preprocess, promise, record, set, string, symbol, tuple, undefined,
        union, unknown, void,
    };
    pub use crate::{
        Configurable, IssueKind, Messages, ParseError, ParseOptions, Path, Schema, SchemaError,
        SchemaExt, SchemaOptions, ValidationError, Value, error_map,
    };
}
