use super::Rule;
use crate::issue::{Bound, IssueKind, SizeOrigin};
use crate::value::MAX_SAFE_INTEGER;

/// Number checks.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberRule {
    Min { value: f64, inclusive: bool },
    Max { value: f64, inclusive: bool },
    Int,
    MultipleOf(f64),
    Finite,
    /// Within ±(2^53 - 1)
    Safe,
    /// At most this many decimal places
    Precision(u32),
}

impl Rule for NumberRule {
    fn name(&self) -> &'static str {
        match self {
            Self::Min { .. } => "min",
            Self::Max { .. } => "max",
            Self::Int => "int",
            Self::MultipleOf(_) => "multiple_of",
            Self::Finite => "finite",
            Self::Safe => "safe",
            Self::Precision(_) => "precision",
        }
    }
}

impl NumberRule {
    pub(crate) fn violation(&self, value: f64) -> Option<IssueKind> {
        match self {
            Self::Min { value: min, inclusive } => {
                let failed = if *inclusive { value < *min } else { value <= *min };
                failed.then(|| IssueKind::TooSmall {
                    origin: SizeOrigin::Number,
                    minimum: Bound::Number(*min),
                    inclusive: *inclusive,
                    exact: false,
                })
            }
            Self::Max { value: max, inclusive } => {
                let failed = if *inclusive { value > *max } else { value >= *max };
                failed.then(|| IssueKind::TooBig {
                    origin: SizeOrigin::Number,
                    maximum: Bound::Number(*max),
                    inclusive: *inclusive,
                    exact: false,
                })
            }
            Self::Int => (value.fract() != 0.0 || !value.is_finite()).then_some(IssueKind::NotInteger),
            Self::MultipleOf(step) => (float_safe_remainder(value, *step) != 0.0).then(|| {
                IssueKind::NotMultipleOf {
                    multiple_of: Bound::Number(*step),
                }
            }),
            Self::Finite => (!value.is_finite()).then_some(IssueKind::NotFinite),
            Self::Safe if value < -MAX_SAFE_INTEGER => Some(IssueKind::TooSmall {
                origin: SizeOrigin::Number,
                minimum: Bound::Number(-MAX_SAFE_INTEGER),
                inclusive: true,
                exact: false,
            }),
            Self::Safe if value > MAX_SAFE_INTEGER => Some(IssueKind::TooBig {
                origin: SizeOrigin::Number,
                maximum: Bound::Number(MAX_SAFE_INTEGER),
                inclusive: true,
                exact: false,
            }),
            Self::Safe => None,
            Self::Precision(max_decimals) => (decimal_places(value) > *max_decimals)
                .then(|| IssueKind::TooPrecise {
                    max_decimals: *max_decimals,
                }),
        }
    }
}

/// Digits after the decimal point in the shortest representation.
fn decimal_places(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let text = value.to_string();
    text.split_once('.')
        .map_or(0, |(_, fraction)| fraction.len() as u32)
}

/// `value % step` computed on scaled integers, so `0.3 % 0.1` is 0.
fn float_safe_remainder(value: f64, step: f64) -> f64 {
    let decimals = decimal_places(value).max(decimal_places(step)).min(15);
    let factor = 10f64.powi(decimals as i32);
    let scaled_step = (step * factor).round();
    if scaled_step == 0.0 {
        return f64::NAN;
    }
    ((value * factor).round() % scaled_step) / factor
}
