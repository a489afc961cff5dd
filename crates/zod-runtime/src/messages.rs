//! Issue messages
//!
//! Messages are resolved once, when an issue is recorded, in this order:
//!
//! 1. the message attached to the failing check
//! 2. the error map passed to the parse call ([`ParseOptions`](crate::ParseOptions))
//! 3. the error map of the schema node
//! 4. the schema node's per-kind [`Messages`]
//! 5. the engine-wide error map from [`EngineConfig`](crate::EngineConfig)
//! 6. the built-in English [`default_message`]
//!
//! An [`ErrorMap`] returning `None` defers to the next step.

use crate::config::{self, SchemaOptions};
use crate::issue::{Bound, IssueKind, SizeOrigin, StringFormat};
use crate::path::Path;
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps an issue to a message, or defers with `None`.
pub type ErrorMap = Arc<dyn Fn(&IssueKind, &ErrorMapContext<'_>) -> Option<String> + Send + Sync>;

/// What an [`ErrorMap`] sees besides the issue kind.
#[derive(Debug, Clone, Copy)]
pub struct ErrorMapContext<'a> {
    /// The value under validation when the issue was raised
    pub data: &'a Value,
    /// Where the issue was raised
    pub path: &'a Path,
    /// The built-in message for this issue
    pub default_message: &'a str,
}

/// Wrap a closure as an [`ErrorMap`].
pub fn error_map<F>(map: F) -> ErrorMap
where
    F: Fn(&IssueKind, &ErrorMapContext<'_>) -> Option<String> + Send + Sync + 'static,
{
    Arc::new(map)
}

/// Per-kind message overrides attached to a schema node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    /// Message for `invalid_type` issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_type: Option<String>,
    /// Message for `required` issues (and `invalid_type` on a missing value)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    /// Messages for any other issue code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_code: BTreeMap<String, String>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "This method returns new Messages and does not modify self"]
    pub fn with_invalid_type(mut self, message: impl Into<String>) -> Self {
        self.invalid_type = Some(message.into());
        self
    }

    #[must_use = "This method returns new Messages and does not modify self"]
    pub fn with_required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    #[must_use = "This method returns new Messages and does not modify self"]
    pub fn with_code(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.by_code.insert(code.into(), message.into());
        self
    }

    /// The override for an issue, if any.
    pub fn lookup(&self, kind: &IssueKind, data: &Value) -> Option<&str> {
        let specific = match kind {
            IssueKind::InvalidType { .. } if data.is_undefined() => {
                self.required.as_ref().or(self.invalid_type.as_ref())
            }
            IssueKind::InvalidType { .. } => self.invalid_type.as_ref(),
            IssueKind::Required => self.required.as_ref(),
            _ => None,
        };
        specific
            .or_else(|| self.by_code.get(kind.code()))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.invalid_type.is_none() && self.required.is_none() && self.by_code.is_empty()
    }
}

/// Resolve the message of a new issue.
pub(crate) fn resolve(
    kind: &IssueKind,
    explicit: Option<&str>,
    contextual: Option<&ErrorMap>,
    options: &SchemaOptions,
    data: &Value,
    path: &Path,
) -> String {
    if let Some(message) = explicit {
        return message.to_string();
    }
    let default = default_message(kind);
    let ctx = ErrorMapContext {
        data,
        path,
        default_message: &default,
    };
    contextual
        .and_then(|map| map(kind, &ctx))
        .or_else(|| options.error_map.as_ref().and_then(|map| map(kind, &ctx)))
        .or_else(|| options.messages.lookup(kind, data).map(str::to_string))
        .or_else(|| {
            config::global()
                .error_map
                .as_ref()
                .and_then(|map| map(kind, &ctx))
        })
        .unwrap_or(default)
}

// =============================================================================
// Default Formatter
// =============================================================================

/// The built-in English message for an issue kind.
pub fn default_message(kind: &IssueKind) -> String {
    match kind {
        IssueKind::InvalidType { received, .. } if *received == ValueType::Undefined => {
            "Required".to_string()
        }
        IssueKind::InvalidType { expected, received } => {
            format!("Expected {}, received {}", expected, received)
        }
        IssueKind::Required => "Required".to_string(),
        IssueKind::Forbidden { received } => format!("Value of type {} is not allowed", received),
        IssueKind::InvalidLiteral { expected, .. } => {
            format!("Invalid literal value, expected {}", expected)
        }
        IssueKind::InvalidEnumValue { options, received } => format!(
            "Invalid enum value. Expected {}, received {}",
            quoted(options.iter().map(String::as_str)),
            received
        ),
        IssueKind::UnrecognizedKeys { keys } => format!(
            "Unrecognized key(s) in object: {}",
            keys.iter()
                .map(|k| format!("'{}'", k))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        IssueKind::InvalidUnion { .. } => "Invalid input".to_string(),
        IssueKind::InvalidUnionDiscriminator { options, .. } => format!(
            "Invalid discriminator value. Expected {}",
            options
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" | ")
        ),
        IssueKind::InvalidIntersectionTypes => {
            "Intersection results could not be merged".to_string()
        }
        IssueKind::InvalidDate => "Invalid date".to_string(),
        IssueKind::InvalidString { validation, detail } => string_message(*validation, detail),
        IssueKind::NotInteger => "Expected integer, received float".to_string(),
        IssueKind::TooSmall {
            origin,
            minimum,
            inclusive,
            exact,
        } => too_small_message(*origin, minimum, *inclusive, *exact),
        IssueKind::TooBig {
            origin,
            maximum,
            inclusive,
            exact,
        } => too_big_message(*origin, maximum, *inclusive, *exact),
        IssueKind::NotMultipleOf { multiple_of } => {
            format!("Number must be a multiple of {}", multiple_of)
        }
        IssueKind::NotFinite => "Number must be finite".to_string(),
        IssueKind::TooPrecise { max_decimals } => {
            format!("Number must have at most {} decimal place(s)", max_decimals)
        }
        IssueKind::NotUnique { origin, .. } => match origin {
            SizeOrigin::Set => "Set members must be unique".to_string(),
            _ => "Array elements must be unique".to_string(),
        },
        IssueKind::Custom { .. } => "Invalid input".to_string(),
    }
}

fn quoted<'a>(options: impl Iterator<Item = &'a str>) -> String {
    options
        .map(|o| format!("'{}'", o))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn string_message(validation: StringFormat, detail: &Option<String>) -> String {
    let detail = detail.as_deref().unwrap_or_default();
    match validation {
        StringFormat::Regex => "Invalid".to_string(),
        StringFormat::Includes => format!("Invalid input: must include \"{}\"", detail),
        StringFormat::StartsWith => format!("Invalid input: must start with \"{}\"", detail),
        StringFormat::EndsWith => format!("Invalid input: must end with \"{}\"", detail),
        other => format!("Invalid {}", other.as_str()),
    }
}

fn unit(origin: SizeOrigin) -> (&'static str, &'static str) {
    match origin {
        SizeOrigin::String => ("String", "character(s)"),
        SizeOrigin::Array => ("Array", "element(s)"),
        SizeOrigin::Set => ("Set", "element(s)"),
        SizeOrigin::Number => ("Number", ""),
        SizeOrigin::BigInt => ("BigInt", ""),
        SizeOrigin::Date => ("Date", ""),
    }
}

fn too_small_message(origin: SizeOrigin, minimum: &Bound, inclusive: bool, exact: bool) -> String {
    let (subject, noun) = unit(origin);
    match origin {
        SizeOrigin::String | SizeOrigin::Array | SizeOrigin::Set => {
            let quantifier = if exact {
                "exactly"
            } else if inclusive {
                "at least"
            } else {
                "more than"
            };
            format!("{} must contain {} {} {}", subject, quantifier, minimum, noun)
        }
        SizeOrigin::Date => {
            let relation = if inclusive { "greater than or equal to" } else { "greater than" };
            format!("Date must be {} {}", relation, minimum)
        }
        SizeOrigin::Number | SizeOrigin::BigInt => {
            let relation = if exact {
                "exactly equal to"
            } else if inclusive {
                "greater than or equal to"
            } else {
                "greater than"
            };
            format!("{} must be {} {}", subject, relation, minimum)
        }
    }
}

fn too_big_message(origin: SizeOrigin, maximum: &Bound, inclusive: bool, exact: bool) -> String {
    let (subject, noun) = unit(origin);
    match origin {
        SizeOrigin::String | SizeOrigin::Array | SizeOrigin::Set => {
            let quantifier = if exact {
                "exactly"
            } else if inclusive {
                "at most"
            } else {
                "less than"
            };
            format!("{} must contain {} {} {}", subject, quantifier, maximum, noun)
        }
        SizeOrigin::Date => {
            let relation = if inclusive { "smaller than or equal to" } else { "smaller than" };
            format!("Date must be {} {}", relation, maximum)
        }
        SizeOrigin::Number | SizeOrigin::BigInt => {
            let relation = if exact {
                "exactly equal to"
            } else if inclusive {
                "less than or equal to"
            } else {
                "less than"
            };
            format!("{} must be {} {}", subject, relation, maximum)
        }
    }
}
