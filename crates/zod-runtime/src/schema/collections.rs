//! Arrays, tuples, sets and records
//!
//! Size checks run before any element is validated. Elements are validated
//! at their index (array, tuple, set in insertion order) or key (record).

use super::{Resolve, Schema, run_all};
use crate::checks::{self, CheckList, SizeRule, check_methods};
use crate::config::SchemaOptions;
use crate::context::{ParseContext, ParseResult, ParseReturn};
use crate::error::SchemaError;
use crate::issue::{Bound, IssueKind, SizeOrigin};
use crate::path::Path;
use crate::value::{ObjectMap, Value, ValueType};

/// Effective `(min, max)` item counts of a size check list.
pub(crate) fn size_bounds(checks: &CheckList<SizeRule>) -> (Option<usize>, Option<usize>) {
    let mut min: Option<usize> = None;
    let mut max: Option<usize> = None;
    for check in checks.active() {
        match check.rule {
            SizeRule::Min { value, inclusive } => {
                let bound = if inclusive { value } else { value + 1 };
                min = Some(min.map_or(bound, |m| m.max(bound)));
            }
            SizeRule::Max { value, inclusive } => {
                let bound = if inclusive { Some(value) } else { value.checked_sub(1) };
                if let Some(bound) = bound {
                    max = Some(max.map_or(bound, |m| m.min(bound)));
                }
            }
            SizeRule::Exact(value) => {
                min = Some(value);
                max = Some(value);
            }
            SizeRule::Unique => {}
        }
    }
    (min, max)
}

fn collect_ok(results: Vec<ParseResult>) -> Vec<Value> {
    results.into_iter().filter_map(Result::ok).collect()
}

// =============================================================================
// Array
// =============================================================================

#[derive(Clone)]
pub struct ArraySchema {
    pub(crate) options: SchemaOptions,
    element: Schema,
    pub(crate) checks: CheckList<SizeRule>,
}

impl ArraySchema {
    pub fn new(element: impl Into<Schema>) -> Self {
        Self {
            options: SchemaOptions::default(),
            element: element.into(),
            checks: CheckList::new(),
        }
    }

    check_methods!(SizeRule);

    pub fn element(&self) -> &Schema {
        &self.element
    }

    /// At least `n` items.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn min(self, n: usize) -> Self {
        self.rule(SizeRule::Min { value: n, inclusive: true })
    }

    /// More than `n` items.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn min_exclusive(self, n: usize) -> Self {
        self.rule(SizeRule::Min { value: n, inclusive: false })
    }

    /// At most `n` items.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn max(self, n: usize) -> Self {
        self.rule(SizeRule::Max { value: n, inclusive: true })
    }

    /// Fewer than `n` items.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn max_exclusive(self, n: usize) -> Self {
        self.rule(SizeRule::Max { value: n, inclusive: false })
    }

    /// Exactly `n` items. Replaces `min` and `max`.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn length(self, n: usize) -> Self {
        self.rule(SizeRule::Exact(n))
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn nonempty(self) -> Self {
        self.min(1)
    }

    /// No two items equal.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn unique(self) -> Self {
        self.rule(SizeRule::Unique)
    }

    pub fn min_items(&self) -> Option<usize> {
        size_bounds(&self.checks).0
    }

    pub fn max_items(&self) -> Option<usize> {
        size_bounds(&self.checks).1
    }
}

impl Resolve for ArraySchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        let Value::Array(items) = ctx.data() else {
            ctx.invalid_type(&self.options, ValueType::Array);
            return ctx.abort().into();
        };
        checks::evaluate(&self.checks, &ctx, &self.options, |rule| {
            rule.violation(SizeOrigin::Array, items)
        });
        if ctx.should_abort() {
            return ctx.abort().into();
        }
        let Value::Array(items) = ctx.take_data() else {
            return ctx.abort().into();
        };
        let jobs = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (&self.element, ctx.child(index, item)))
            .collect();
        run_all(&ctx, jobs).finish(move |results| ctx.result(Value::Array(collect_ok(results))))
    }
}

// =============================================================================
// Set
// =============================================================================

#[derive(Clone)]
pub struct SetSchema {
    pub(crate) options: SchemaOptions,
    element: Schema,
    pub(crate) checks: CheckList<SizeRule>,
}

impl SetSchema {
    pub fn new(element: impl Into<Schema>) -> Self {
        Self {
            options: SchemaOptions::default(),
            element: element.into(),
            checks: CheckList::new(),
        }
    }

    check_methods!(SizeRule);

    pub fn element(&self) -> &Schema {
        &self.element
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn min(self, n: usize) -> Self {
        self.rule(SizeRule::Min { value: n, inclusive: true })
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn min_exclusive(self, n: usize) -> Self {
        self.rule(SizeRule::Min { value: n, inclusive: false })
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn max(self, n: usize) -> Self {
        self.rule(SizeRule::Max { value: n, inclusive: true })
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn max_exclusive(self, n: usize) -> Self {
        self.rule(SizeRule::Max { value: n, inclusive: false })
    }

    /// Exactly `n` members. Replaces `min` and `max`.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn size(self, n: usize) -> Self {
        self.rule(SizeRule::Exact(n))
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn nonempty(self) -> Self {
        self.min(1)
    }

    /// Reject inputs carrying equal members; members are otherwise merged.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn unique(self) -> Self {
        self.rule(SizeRule::Unique)
    }

    pub fn min_items(&self) -> Option<usize> {
        size_bounds(&self.checks).0
    }

    pub fn max_items(&self) -> Option<usize> {
        size_bounds(&self.checks).1
    }
}

impl Resolve for SetSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        let Value::Set(members) = ctx.data() else {
            ctx.invalid_type(&self.options, ValueType::Set);
            return ctx.abort().into();
        };
        checks::evaluate(&self.checks, &ctx, &self.options, |rule| {
            rule.violation(SizeOrigin::Set, members)
        });
        if ctx.should_abort() {
            return ctx.abort().into();
        }
        let Value::Set(members) = ctx.take_data() else {
            return ctx.abort().into();
        };
        let jobs = members
            .into_iter()
            .enumerate()
            .map(|(index, member)| (&self.element, ctx.child(index, member)))
            .collect();
        run_all(&ctx, jobs).finish(move |results| {
            let mut output: Vec<Value> = Vec::new();
            for value in collect_ok(results) {
                if !output.contains(&value) {
                    output.push(value);
                }
            }
            ctx.result(Value::Set(output))
        })
    }
}

// =============================================================================
// Tuple
// =============================================================================

/// Fixed-position items, optionally followed by any number of `rest` items.
#[derive(Clone)]
pub struct TupleSchema {
    pub(crate) options: SchemaOptions,
    pub(crate) items: Vec<Schema>,
    rest: Option<Schema>,
}

impl TupleSchema {
    pub fn new<S: Into<Schema>>(items: impl IntoIterator<Item = S>) -> Self {
        Self {
            options: SchemaOptions::default(),
            items: items.into_iter().map(Into::into).collect(),
            rest: None,
        }
    }

    /// Schema for items past the fixed positions.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn rest(mut self, schema: impl Into<Schema>) -> Self {
        self.rest = Some(schema.into());
        self
    }

    pub fn items(&self) -> &[Schema] {
        &self.items
    }

    pub fn rest_schema(&self) -> Option<&Schema> {
        self.rest.as_ref()
    }

    /// Put `schema` at position `index`, which must be the next free one.
    pub(crate) fn place(&mut self, slot: &Path, index: usize, schema: Schema) -> Result<(), SchemaError> {
        let len = self.items.len();
        match index.cmp(&len) {
            std::cmp::Ordering::Equal => {
                self.items.push(schema);
                Ok(())
            }
            std::cmp::Ordering::Less => Err(SchemaError::SlotOccupied { slot: slot.clone() }),
            std::cmp::Ordering::Greater => Err(SchemaError::SlotOutOfRange {
                slot: slot.clone(),
                len,
            }),
        }
    }
}

impl Resolve for TupleSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        let Value::Array(input) = ctx.data() else {
            ctx.invalid_type(&self.options, ValueType::Array);
            return ctx.abort().into();
        };
        let fixed = self.items.len();
        if input.len() < fixed {
            let kind = IssueKind::TooSmall {
                origin: SizeOrigin::Array,
                minimum: Bound::Count(fixed),
                inclusive: true,
                exact: self.rest.is_none(),
            };
            ctx.add_issue(&self.options, kind, None);
            return ctx.abort().into();
        }
        if self.rest.is_none() && input.len() > fixed {
            let kind = IssueKind::TooBig {
                origin: SizeOrigin::Array,
                maximum: Bound::Count(fixed),
                inclusive: true,
                exact: true,
            };
            ctx.add_issue(&self.options, kind, None);
            if ctx.should_abort() {
                return ctx.abort().into();
            }
        }
        let Value::Array(input) = ctx.take_data() else {
            return ctx.abort().into();
        };
        let jobs = input
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let schema = self.items.get(index).or(self.rest.as_ref())?;
                Some((schema, ctx.child(index, item)))
            })
            .collect();
        run_all(&ctx, jobs).finish(move |results| ctx.result(Value::Array(collect_ok(results))))
    }
}

// =============================================================================
// Record
// =============================================================================

/// Objects with arbitrary keys: each key against `key`, each value against
/// `value`.
#[derive(Clone)]
pub struct RecordSchema {
    pub(crate) options: SchemaOptions,
    key: Schema,
    value: Schema,
}

impl RecordSchema {
    pub fn new(key: impl Into<Schema>, value: impl Into<Schema>) -> Self {
        Self {
            options: SchemaOptions::default(),
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key_schema(&self) -> &Schema {
        &self.key
    }

    pub fn value_schema(&self) -> &Schema {
        &self.value
    }
}

impl Resolve for RecordSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        if !matches!(ctx.data(), Value::Object(_)) {
            ctx.invalid_type(&self.options, ValueType::Object);
            return ctx.abort().into();
        }
        let Value::Object(input) = ctx.take_data() else {
            return ctx.abort().into();
        };
        let mut jobs = Vec::with_capacity(input.len() * 2);
        for (key, value) in input {
            jobs.push((&self.key, ctx.child(key.as_str(), Value::String(key.clone()))));
            jobs.push((&self.value, ctx.child(key.as_str(), value)));
        }
        run_all(&ctx, jobs).finish(move |results| {
            let mut output = ObjectMap::with_capacity(results.len() / 2);
            let mut results = results.into_iter();
            while let (Some(key), Some(value)) = (results.next(), results.next()) {
                if let (Ok(key), Ok(value)) = (key, value) {
                    let key = match key {
                        Value::String(key) => key,
                        other => other.to_js_string(),
                    };
                    output.insert(key, value);
                }
            }
            ctx.result(Value::Object(output))
        })
    }
}
