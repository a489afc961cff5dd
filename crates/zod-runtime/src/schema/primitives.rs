use super::{Resolve, coerce};
use crate::checks::{
    self, BigIntRule, CheckList, DateRule, IpVersion, NumberRule, StringRule, check_methods,
};
use crate::config::SchemaOptions;
use crate::context::{ParseContext, ParseReturn};
use crate::error::SchemaError;
use crate::issue::IssueKind;
use crate::value::{MAX_SAFE_INTEGER, Value, ValueType};
use chrono::{DateTime, Utc};
use regex::Regex;

/// Fail the node unless `valid`, otherwise succeed with the current data.
fn conclude<'a>(mut ctx: ParseContext, valid: bool) -> ParseReturn<'a> {
    if valid {
        ParseReturn::Ready(Ok(ctx.take_data()))
    } else {
        ctx.abort().into()
    }
}

fn mismatch<'a>(ctx: &ParseContext, options: &SchemaOptions, expected: ValueType) -> ParseReturn<'a> {
    ctx.invalid_type(options, expected);
    ctx.abort().into()
}

// =============================================================================
// String
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Case {
    Lower,
    Upper,
}

/// Strings, with format and length checks.
#[derive(Clone, Default)]
pub struct StringSchema {
    pub(crate) options: SchemaOptions,
    pub(crate) checks: CheckList<StringRule>,
    coerce: bool,
    trim: bool,
    case: Option<Case>,
}

impl StringSchema {
    pub fn new() -> Self {
        Self::default()
    }

    check_methods!(StringRule);

    /// At least `n` characters.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn min(self, n: usize) -> Self {
        self.rule(StringRule::Min(n))
    }

    /// At most `n` characters.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn max(self, n: usize) -> Self {
        self.rule(StringRule::Max(n))
    }

    /// Exactly `n` characters. Replaces `min` and `max`.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn length(self, n: usize) -> Self {
        self.rule(StringRule::Length(n))
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn nonempty(self) -> Self {
        self.min(1)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn email(self) -> Self {
        self.rule(StringRule::Email)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn url(self) -> Self {
        self.rule(StringRule::Url)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn uuid(self) -> Self {
        self.rule(StringRule::Uuid)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn cuid(self) -> Self {
        self.rule(StringRule::Cuid)
    }

    /// Must match the pattern. Several patterns may be combined.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn regex(self, pattern: Regex) -> Self {
        self.rule(StringRule::Regex(pattern))
    }

    /// Compile `pattern` and add it as a regex check.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidPattern`] if the pattern does not compile.
    pub fn pattern(self, pattern: &str) -> Result<Self, SchemaError> {
        Ok(self.regex(Regex::new(pattern)?))
    }

    /// Must contain `needle`. Several substrings may be combined.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn includes(self, needle: impl Into<String>) -> Self {
        self.rule(StringRule::Includes(needle.into()))
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn starts_with(self, prefix: impl Into<String>) -> Self {
        self.rule(StringRule::StartsWith(prefix.into()))
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn ends_with(self, suffix: impl Into<String>) -> Self {
        self.rule(StringRule::EndsWith(suffix.into()))
    }

    /// RFC 3339 timestamp in UTC (`Z` suffix).
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn datetime(self) -> Self {
        self.rule(StringRule::Datetime { offset: false })
    }

    /// RFC 3339 timestamp with any offset.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn datetime_with_offset(self) -> Self {
        self.rule(StringRule::Datetime { offset: true })
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn ip(self) -> Self {
        self.rule(StringRule::Ip(None))
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn ipv4(self) -> Self {
        self.rule(StringRule::Ip(Some(IpVersion::V4)))
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn ipv6(self) -> Self {
        self.rule(StringRule::Ip(Some(IpVersion::V6)))
    }

    /// Strip surrounding whitespace before the checks run.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn to_lower_case(mut self) -> Self {
        self.case = Some(Case::Lower);
        self
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn to_upper_case(mut self) -> Self {
        self.case = Some(Case::Upper);
        self
    }

    /// Convert any input with `String(value)` semantics first.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Effective minimum length from the enabled checks.
    pub fn min_length(&self) -> Option<usize> {
        self.checks
            .active()
            .filter_map(|check| match check.rule {
                StringRule::Min(n) | StringRule::Length(n) => Some(n),
                _ => None,
            })
            .max()
    }

    /// Effective maximum length from the enabled checks.
    pub fn max_length(&self) -> Option<usize> {
        self.checks
            .active()
            .filter_map(|check| match check.rule {
                StringRule::Max(n) | StringRule::Length(n) => Some(n),
                _ => None,
            })
            .min()
    }

    fn normalize(&self, text: &str) -> Option<String> {
        if !self.trim && self.case.is_none() {
            return None;
        }
        let text = if self.trim { text.trim() } else { text };
        Some(match self.case {
            Some(Case::Lower) => text.to_lowercase(),
            Some(Case::Upper) => text.to_uppercase(),
            None => text.to_string(),
        })
    }
}

impl Resolve for StringSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        if self.coerce {
            let coerced = coerce::to_string(ctx.data());
            ctx.set_data(coerced);
        }
        let Some(text) = ctx.data().as_str() else {
            return mismatch(&ctx, &self.options, ValueType::String);
        };
        if let Some(normalized) = self.normalize(text) {
            ctx.set_data(Value::String(normalized));
        }
        let text = ctx.data().as_str().unwrap_or_default();
        let valid = checks::evaluate(&self.checks, &ctx, &self.options, |rule| {
            rule.violation(text)
        });
        conclude(ctx, valid)
    }
}

// =============================================================================
// Number
// =============================================================================

/// Numbers (`NaN` excluded).
#[derive(Clone, Default)]
pub struct NumberSchema {
    pub(crate) options: SchemaOptions,
    pub(crate) checks: CheckList<NumberRule>,
    coerce: bool,
}

impl NumberSchema {
    pub fn new() -> Self {
        Self::default()
    }

    check_methods!(NumberRule);

    /// Greater than `value`.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn gt(self, value: f64) -> Self {
        self.rule(NumberRule::Min { value, inclusive: false })
    }

    /// Greater than or equal to `value`.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn gte(self, value: f64) -> Self {
        self.rule(NumberRule::Min { value, inclusive: true })
    }

    /// Alias of [`gte`](Self::gte).
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn min(self, value: f64) -> Self {
        self.gte(value)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn lt(self, value: f64) -> Self {
        self.rule(NumberRule::Max { value, inclusive: false })
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn lte(self, value: f64) -> Self {
        self.rule(NumberRule::Max { value, inclusive: true })
    }

    /// Alias of [`lte`](Self::lte).
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn max(self, value: f64) -> Self {
        self.lte(value)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn positive(self) -> Self {
        self.gt(0.0)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn nonnegative(self) -> Self {
        self.gte(0.0)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn negative(self) -> Self {
        self.lt(0.0)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn nonpositive(self) -> Self {
        self.lte(0.0)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn int(self) -> Self {
        self.rule(NumberRule::Int)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn multiple_of(self, step: f64) -> Self {
        self.rule(NumberRule::MultipleOf(step))
    }

    /// Alias of [`multiple_of`](Self::multiple_of).
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn step(self, step: f64) -> Self {
        self.multiple_of(step)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn finite(self) -> Self {
        self.rule(NumberRule::Finite)
    }

    /// Within the range of exactly representable integers.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn safe(self) -> Self {
        self.rule(NumberRule::Safe)
    }

    /// At most `decimals` decimal places.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn precision(self, decimals: u32) -> Self {
        self.rule(NumberRule::Precision(decimals))
    }

    /// Convert any input with `Number(value)` semantics first.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    pub fn is_int(&self) -> bool {
        self.checks.has("int")
    }

    /// Effective lower bound from the enabled checks.
    pub fn min_value(&self) -> Option<f64> {
        let bounds = self.checks.active().filter_map(|check| match check.rule {
            NumberRule::Min { value, .. } => Some(value),
            NumberRule::Safe => Some(-MAX_SAFE_INTEGER),
            _ => None,
        });
        bounds.reduce(f64::max)
    }

    /// Effective upper bound from the enabled checks.
    pub fn max_value(&self) -> Option<f64> {
        let bounds = self.checks.active().filter_map(|check| match check.rule {
            NumberRule::Max { value, .. } => Some(value),
            NumberRule::Safe => Some(MAX_SAFE_INTEGER),
            _ => None,
        });
        bounds.reduce(f64::min)
    }
}

impl Resolve for NumberSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        if self.coerce {
            let coerced = coerce::to_number(ctx.data());
            ctx.set_data(coerced);
        }
        let number = match ctx.data() {
            Value::Number(n) if !n.is_nan() => *n,
            _ => return mismatch(&ctx, &self.options, ValueType::Number),
        };
        let valid = checks::evaluate(&self.checks, &ctx, &self.options, |rule| {
            rule.violation(number)
        });
        conclude(ctx, valid)
    }
}

// =============================================================================
// BigInt
// =============================================================================

/// Big integers.
#[derive(Clone, Default)]
pub struct BigIntSchema {
    pub(crate) options: SchemaOptions,
    pub(crate) checks: CheckList<BigIntRule>,
    coerce: bool,
}

impl BigIntSchema {
    pub fn new() -> Self {
        Self::default()
    }

    check_methods!(BigIntRule);

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn gt(self, value: i128) -> Self {
        self.rule(BigIntRule::Min { value, inclusive: false })
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn gte(self, value: i128) -> Self {
        self.rule(BigIntRule::Min { value, inclusive: true })
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn min(self, value: i128) -> Self {
        self.gte(value)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn lt(self, value: i128) -> Self {
        self.rule(BigIntRule::Max { value, inclusive: false })
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn lte(self, value: i128) -> Self {
        self.rule(BigIntRule::Max { value, inclusive: true })
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn max(self, value: i128) -> Self {
        self.lte(value)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn positive(self) -> Self {
        self.gt(0)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn nonnegative(self) -> Self {
        self.gte(0)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn negative(self) -> Self {
        self.lt(0)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn nonpositive(self) -> Self {
        self.lte(0)
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn multiple_of(self, step: i128) -> Self {
        self.rule(BigIntRule::MultipleOf(step))
    }

    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }
}

impl Resolve for BigIntSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        if self.coerce {
            let coerced = coerce::to_bigint(ctx.data());
            ctx.set_data(coerced);
        }
        let Value::BigInt(number) = *ctx.data() else {
            return mismatch(&ctx, &self.options, ValueType::BigInt);
        };
        let valid = checks::evaluate(&self.checks, &ctx, &self.options, |rule| {
            rule.violation(number)
        });
        conclude(ctx, valid)
    }
}

// =============================================================================
// Boolean
// =============================================================================

#[derive(Clone, Default)]
pub struct BooleanSchema {
    pub(crate) options: SchemaOptions,
    coerce: bool,
}

impl BooleanSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert any input by truthiness first.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }
}

impl Resolve for BooleanSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        if self.coerce {
            let coerced = coerce::to_boolean(ctx.data());
            ctx.set_data(coerced);
        }
        match ctx.data() {
            Value::Bool(_) => conclude(ctx, true),
            _ => mismatch(&ctx, &self.options, ValueType::Boolean),
        }
    }
}

// =============================================================================
// Date
// =============================================================================

#[derive(Clone, Default)]
pub struct DateSchema {
    pub(crate) options: SchemaOptions,
    pub(crate) checks: CheckList<DateRule>,
    coerce: bool,
}

impl DateSchema {
    pub fn new() -> Self {
        Self::default()
    }

    check_methods!(DateRule);

    /// On or after `value`.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn min(self, value: DateTime<Utc>) -> Self {
        self.rule(DateRule::Min(value))
    }

    /// On or before `value`.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn max(self, value: DateTime<Utc>) -> Self {
        self.rule(DateRule::Max(value))
    }

    /// Accept RFC 3339 strings, `YYYY-MM-DD` strings and epoch milliseconds.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }
}

impl Resolve for DateSchema {
    fn resolve<'a>(&'a self, mut ctx: ParseContext) -> ParseReturn<'a> {
        if self.coerce {
            match coerce::to_date(ctx.data()) {
                Some(date) => ctx.set_data(Value::Date(date)),
                None => {
                    ctx.add_issue(&self.options, IssueKind::InvalidDate, None);
                    return ctx.abort().into();
                }
            }
        }
        let Value::Date(date) = ctx.data() else {
            return mismatch(&ctx, &self.options, ValueType::Date);
        };
        let valid = checks::evaluate(&self.checks, &ctx, &self.options, |rule| {
            rule.violation(date)
        });
        conclude(ctx, valid)
    }
}

// =============================================================================
// Type-tag Schemas
// =============================================================================

macro_rules! tag_schema {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Default)]
        pub struct $name {
            pub(crate) options: SchemaOptions,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }
        }
    };
}

tag_schema!(
    /// Symbols.
    SymbolSchema
);
tag_schema!(
    /// Only `undefined`.
    UndefinedSchema
);
tag_schema!(
    /// Only `null`.
    NullSchema
);
tag_schema!(
    /// Only `undefined`, for functions returning nothing.
    VoidSchema
);
tag_schema!(
    /// Anything.
    AnySchema
);
tag_schema!(
    /// Anything.
    UnknownSchema
);
tag_schema!(
    /// Nothing; every value raises `forbidden`.
    NeverSchema
);
tag_schema!(
    /// Only `NaN`.
    NanSchema
);

impl Resolve for SymbolSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        match ctx.data() {
            Value::Symbol(_) => conclude(ctx, true),
            _ => mismatch(&ctx, &self.options, ValueType::Symbol),
        }
    }
}

impl Resolve for UndefinedSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        match ctx.data() {
            Value::Undefined => conclude(ctx, true),
            _ => mismatch(&ctx, &self.options, ValueType::Undefined),
        }
    }
}

impl Resolve for NullSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        match ctx.data() {
            Value::Null => conclude(ctx, true),
            _ => mismatch(&ctx, &self.options, ValueType::Null),
        }
    }
}

impl Resolve for VoidSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        match ctx.data() {
            Value::Undefined => conclude(ctx, true),
            _ => mismatch(&ctx, &self.options, ValueType::Undefined),
        }
    }
}

impl Resolve for AnySchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        conclude(ctx, true)
    }
}

impl Resolve for UnknownSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        conclude(ctx, true)
    }
}

impl Resolve for NeverSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        let kind = IssueKind::Forbidden {
            received: ctx.data().value_type(),
        };
        ctx.add_issue(&self.options, kind, None);
        ctx.abort().into()
    }
}

impl Resolve for NanSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        match ctx.data() {
            Value::Number(n) if n.is_nan() => conclude(ctx, true),
            _ => mismatch(&ctx, &self.options, ValueType::Nan),
        }
    }
}

// =============================================================================
// Literal & Enum
// =============================================================================

/// Exactly one value.
#[derive(Clone)]
pub struct LiteralSchema {
    pub(crate) options: SchemaOptions,
    value: Value,
}

impl LiteralSchema {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            options: SchemaOptions::default(),
            value: value.into(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Resolve for LiteralSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        if *ctx.data() == self.value {
            return conclude(ctx, true);
        }
        let kind = IssueKind::InvalidLiteral {
            expected: self.value.clone(),
            received: ctx.data().clone(),
        };
        ctx.add_issue(&self.options, kind, None);
        ctx.abort().into()
    }
}

/// One of a fixed set of strings.
#[derive(Clone)]
pub struct EnumSchema {
    pub(crate) options: SchemaOptions,
    values: Vec<String>,
}

impl EnumSchema {
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for value in values.into_iter().map(Into::into) {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Self {
            options: SchemaOptions::default(),
            values: unique,
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// A new enum with only the given members.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn extract(&self, keep: &[&str]) -> Self {
        self.filtered(|value| keep.contains(&value))
    }

    /// A new enum without the given members.
    #[must_use = "This method returns a new schema and does not modify self"]
    pub fn exclude(&self, drop: &[&str]) -> Self {
        self.filtered(|value| !drop.contains(&value))
    }

    fn filtered(&self, keep: impl Fn(&str) -> bool) -> Self {
        Self {
            options: self.options.clone(),
            values: self
                .values
                .iter()
                .filter(|value| keep(value.as_str()))
                .cloned()
                .collect(),
        }
    }
}

impl Resolve for EnumSchema {
    fn resolve<'a>(&'a self, ctx: ParseContext) -> ParseReturn<'a> {
        let Some(text) = ctx.data().as_str() else {
            return mismatch(&ctx, &self.options, ValueType::String);
        };
        if self.values.iter().any(|value| value == text) {
            return conclude(ctx, true);
        }
        let kind = IssueKind::InvalidEnumValue {
            options: self.values.clone(),
            received: ctx.data().clone(),
        };
        ctx.add_issue(&self.options, kind, None);
        ctx.abort().into()
    }
}
