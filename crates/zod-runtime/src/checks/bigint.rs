use super::Rule;
use crate::issue::{Bound, IssueKind, SizeOrigin};

/// Big integer checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BigIntRule {
    Min { value: i128, inclusive: bool },
    Max { value: i128, inclusive: bool },
    MultipleOf(i128),
}

impl Rule for BigIntRule {
    fn name(&self) -> &'static str {
        match self {
            Self::Min { .. } => "min",
            Self::Max { .. } => "max",
            Self::MultipleOf(_) => "multiple_of",
        }
    }
}

impl BigIntRule {
    pub(crate) fn violation(&self, value: i128) -> Option<IssueKind> {
        match self {
            Self::Min { value: min, inclusive } => {
                let failed = if *inclusive { value < *min } else { value <= *min };
                failed.then(|| IssueKind::TooSmall {
                    origin: SizeOrigin::BigInt,
                    minimum: Bound::BigInt(*min),
                    inclusive: *inclusive,
                    exact: false,
                })
            }
            Self::Max { value: max, inclusive } => {
                let failed = if *inclusive { value > *max } else { value >= *max };
                failed.then(|| IssueKind::TooBig {
                    origin: SizeOrigin::BigInt,
                    maximum: Bound::BigInt(*max),
                    inclusive: *inclusive,
                    exact: false,
                })
            }
            Self::MultipleOf(step) => {
                let divides = value.checked_rem(*step).is_some_and(|rem| rem == 0);
                (!divides).then(|| IssueKind::NotMultipleOf {
                    multiple_of: Bound::BigInt(*step),
                })
            }
        }
    }
}
