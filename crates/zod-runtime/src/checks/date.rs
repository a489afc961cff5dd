use super::Rule;
use crate::issue::{Bound, IssueKind, SizeOrigin};
use chrono::{DateTime, Utc};

/// Date checks. Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRule {
    Min(DateTime<Utc>),
    Max(DateTime<Utc>),
}

impl Rule for DateRule {
    fn name(&self) -> &'static str {
        match self {
            Self::Min(_) => "min",
            Self::Max(_) => "max",
        }
    }
}

impl DateRule {
    pub(crate) fn violation(&self, value: &DateTime<Utc>) -> Option<IssueKind> {
        match self {
            Self::Min(min) => (value < min).then(|| IssueKind::TooSmall {
                origin: SizeOrigin::Date,
                minimum: Bound::Date(*min),
                inclusive: true,
                exact: false,
            }),
            Self::Max(max) => (value > max).then(|| IssueKind::TooBig {
                origin: SizeOrigin::Date,
                maximum: Bound::Date(*max),
                inclusive: true,
                exact: false,
            }),
        }
    }
}
