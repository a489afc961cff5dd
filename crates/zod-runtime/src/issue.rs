//! Issues and aggregated validation errors
//!
//! Every parse-time failure is recorded as an [`Issue`]: a kind-specific
//! payload ([`IssueKind`]), the [`Path`] of the offending value and a resolved
//! message. Issues are appended in discovery order and surfaced to callers as
//! one [`ValidationError`].
//!
//! Serialized issues are flat records:
//!
//! ```json
//! { "code": "too_small", "origin": "string", "minimum": 3,
//!   "inclusive": true, "exact": false, "path": ["name"],
//!   "message": "String must contain at least 3 character(s)" }
//! ```

use crate::path::Path;
use crate::value::{Value, ValueType, format_number};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Payload Types
// =============================================================================

/// What a size bound applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeOrigin {
    String,
    Number,
    BigInt,
    Date,
    Array,
    Set,
}

impl SizeOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::BigInt => "bigint",
            Self::Date => "date",
            Self::Array => "array",
            Self::Set => "set",
        }
    }
}

/// A bound carried by `too_small` / `too_big` / `not_multiple_of`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bound {
    Count(usize),
    Number(f64),
    BigInt(i128),
    Date(DateTime<Utc>),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{}", n),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::BigInt(n) => write!(f, "{}", n),
            Self::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

/// The string format a `invalid_string` issue refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    Email,
    Url,
    Uuid,
    Cuid,
    Regex,
    Includes,
    StartsWith,
    EndsWith,
    Datetime,
    Ip,
}

impl StringFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Url => "url",
            Self::Uuid => "uuid",
            Self::Cuid => "cuid",
            Self::Regex => "regex",
            Self::Includes => "includes",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Datetime => "datetime",
            Self::Ip => "ip",
        }
    }
}

// =============================================================================
// Issue Kinds
// =============================================================================

/// Kind and payload of an issue.
///
/// The serialized `code` field is the snake_case kind name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IssueKind {
    /// Runtime type tag differs from the expected one
    InvalidType {
        expected: ValueType,
        received: ValueType,
    },

    /// A value was missing where one is required
    Required,

    /// The value matched a schema that accepts nothing
    Forbidden { received: ValueType },

    InvalidLiteral { expected: Value, received: Value },

    InvalidEnumValue { options: Vec<String>, received: Value },

    /// Extra keys on a strict object, sorted
    UnrecognizedKeys { keys: Vec<String> },

    /// No union member matched; one issue list per member, in member order
    InvalidUnion { union_errors: Vec<Vec<Issue>> },

    InvalidUnionDiscriminator {
        discriminator: String,
        options: Vec<Value>,
    },

    InvalidIntersectionTypes,

    InvalidDate,

    InvalidString {
        validation: StringFormat,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    /// A number with a fractional part where an integer was required
    NotInteger,

    TooSmall {
        origin: SizeOrigin,
        minimum: Bound,
        inclusive: bool,
        exact: bool,
    },

    TooBig {
        origin: SizeOrigin,
        maximum: Bound,
        inclusive: bool,
        exact: bool,
    },

    NotMultipleOf { multiple_of: Bound },

    NotFinite,

    TooPrecise { max_decimals: u32 },

    /// Positions of repeated members
    NotUnique {
        origin: SizeOrigin,
        duplicates: Vec<usize>,
    },

    /// Raised by refinements
    Custom {
        #[serde(skip_serializing_if = "Option::is_none")]
        params: Option<serde_json::Value>,
    },
}

impl IssueKind {
    /// The snake_case code of this kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidType { .. } => "invalid_type",
            Self::Required => "required",
            Self::Forbidden { .. } => "forbidden",
            Self::InvalidLiteral { .. } => "invalid_literal",
            Self::InvalidEnumValue { .. } => "invalid_enum_value",
            Self::UnrecognizedKeys { .. } => "unrecognized_keys",
            Self::InvalidUnion { .. } => "invalid_union",
            Self::InvalidUnionDiscriminator { .. } => "invalid_union_discriminator",
            Self::InvalidIntersectionTypes => "invalid_intersection_types",
            Self::InvalidDate => "invalid_date",
            Self::InvalidString { .. } => "invalid_string",
            Self::NotInteger => "not_integer",
            Self::TooSmall { .. } => "too_small",
            Self::TooBig { .. } => "too_big",
            Self::NotMultipleOf { .. } => "not_multiple_of",
            Self::NotFinite => "not_finite",
            Self::TooPrecise { .. } => "too_precise",
            Self::NotUnique { .. } => "not_unique",
            Self::Custom { .. } => "custom",
        }
    }

    /// A custom issue without parameters.
    pub fn custom() -> Self {
        Self::Custom { params: None }
    }
}

// =============================================================================
// Issue
// =============================================================================

/// One recorded validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    #[serde(flatten)]
    pub kind: IssueKind,
    pub path: Path,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, path: Path, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} ({})", self.message, self.code())
        } else {
            write!(f, "{}: {} ({})", self.path, self.message, self.code())
        }
    }
}

// =============================================================================
// Aggregated Error
// =============================================================================

/// All issues of one failed parse, in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(transparent)]
#[error("{}", summarize(.issues))]
pub struct ValidationError {
    issues: Vec<Issue>,
}

fn summarize(issues: &[Issue]) -> String {
    match issues {
        [] => "validation failed".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// Issues split into root-level messages and per-field messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlattenedError {
    pub form_errors: Vec<String>,
    pub field_errors: IndexMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Codes of all issues, in order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.issues.iter().map(Issue::code).collect()
    }

    /// Issues grouped by rendered path, groups in first-seen order.
    pub fn errors_by_path(&self) -> IndexMap<String, Vec<&Issue>> {
        let mut grouped: IndexMap<String, Vec<&Issue>> = IndexMap::new();
        for issue in &self.issues {
            grouped
                .entry(issue.path.to_string())
                .or_default()
                .push(issue);
        }
        grouped
    }

    /// Root issues become form errors; the rest are grouped by their first
    /// path segment.
    pub fn flatten(&self) -> FlattenedError {
        let mut flattened = FlattenedError::default();
        for issue in &self.issues {
            match issue.path.first() {
                None => flattened.form_errors.push(issue.message.clone()),
                Some(segment) => flattened
                    .field_errors
                    .entry(segment.as_key())
                    .or_default()
                    .push(issue.message.clone()),
            }
        }
        flattened
    }
}

impl From<Vec<Issue>> for ValidationError {
    fn from(issues: Vec<Issue>) -> Self {
        Self::new(issues)
    }
}

impl IntoIterator for ValidationError {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationError {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}
