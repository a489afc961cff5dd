//! Error types
//!
//! Parse-time failures of the input are [`Issue`]s aggregated into a
//! [`ValidationError`]. Two other failure classes never become issues:
//!
//! - [`UsageError`]: the caller misused the engine, e.g. parsed a schema with
//!   asynchronous parts synchronously.
//! - [`SchemaError`]: a schema could not be built, e.g. a reference points at
//!   a path that does not exist. Returned by the fallible constructors, never
//!   deferred to parse time.

use crate::issue::{Issue, ValidationError};
use crate::path::{Path, PathParseError};
use thiserror::Error;

/// Caller misuse detected during a parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error(
        "asynchronous refinement or transform at '{path}' reached during a synchronous parse; use parse_async"
    )]
    AsyncInSyncParse { path: Path },

    #[error("promise schema at '{path}' reached during a synchronous parse; use parse_async")]
    PromiseInSyncParse { path: Path },
}

impl UsageError {
    pub fn path(&self) -> &Path {
        match self {
            Self::AsyncInSyncParse { path } | Self::PromiseInSyncParse { path } => path,
        }
    }
}

/// Error returned by `parse` and `parse_async`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The input did not satisfy the schema
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The schema was used incorrectly
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl ParseError {
    /// The recorded issues; empty for usage errors.
    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Validation(error) => error.issues(),
            Self::Usage(_) => &[],
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn into_validation(self) -> Option<ValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            Self::Usage(_) => None,
        }
    }
}

/// A schema could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error(transparent)]
    InvalidPath(#[from] PathParseError),

    #[error("reference target '{target}' does not exist")]
    MissingTarget { target: Path },

    #[error("reference target '{target}' passes through '{at}', a {kind} schema")]
    NotTraversable {
        target: Path,
        at: Path,
        kind: &'static str,
    },

    #[error("reference target '{target}' is a delete marker")]
    DeletedTarget { target: Path },

    #[error("'{slot}' cannot reference itself")]
    SelfReference { slot: Path },

    #[error("reference from '{slot}' to '{target}' is cyclic")]
    CyclicReference { slot: Path, target: Path },

    #[error("slot '{slot}' is already declared")]
    SlotOccupied { slot: Path },

    #[error("slot '{slot}' is out of range for a tuple of {len} item(s)")]
    SlotOutOfRange { slot: Path, len: usize },

    #[error("discriminated union option {index} has no literal value for '{discriminator}'")]
    MissingDiscriminator { discriminator: String, index: usize },

    #[error("discriminator value {value} for '{discriminator}' is used by more than one option")]
    DuplicateDiscriminator { discriminator: String, value: String },

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

impl From<regex::Error> for SchemaError {
    fn from(error: regex::Error) -> Self {
        Self::InvalidPattern(error.to_string())
    }
}

/// Rejected engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("engine configuration is already installed")]
    AlreadyInstalled,

    #[error("invalid engine configuration: {0}")]
    Invalid(String),
}
