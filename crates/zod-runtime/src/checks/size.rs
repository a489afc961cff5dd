use super::Rule;
use crate::issue::{Bound, IssueKind, SizeOrigin};
use crate::value::Value;

/// Size checks of arrays and sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeRule {
    Min { value: usize, inclusive: bool },
    Max { value: usize, inclusive: bool },
    /// Exact length of an array, exact size of a set
    Exact(usize),
    Unique,
}

impl Rule for SizeRule {
    fn name(&self) -> &'static str {
        match self {
            Self::Min { .. } => "min",
            Self::Max { .. } => "max",
            Self::Exact(_) => "length",
            Self::Unique => "unique",
        }
    }

    fn supersedes(&self, existing: &Self) -> bool {
        match (self, existing) {
            (Self::Exact(_), Self::Min { .. } | Self::Max { .. } | Self::Exact(_)) => true,
            (Self::Min { .. } | Self::Max { .. }, Self::Exact(_)) => true,
            _ => self.name() == existing.name(),
        }
    }
}

impl SizeRule {
    pub(crate) fn violation(&self, origin: SizeOrigin, items: &[Value]) -> Option<IssueKind> {
        let len = items.len();
        match self {
            Self::Min { value, inclusive } => {
                let failed = if *inclusive { len < *value } else { len <= *value };
                failed.then(|| IssueKind::TooSmall {
                    origin,
                    minimum: Bound::Count(*value),
                    inclusive: *inclusive,
                    exact: false,
                })
            }
            Self::Max { value, inclusive } => {
                let failed = if *inclusive { len > *value } else { len >= *value };
                failed.then(|| IssueKind::TooBig {
                    origin,
                    maximum: Bound::Count(*value),
                    inclusive: *inclusive,
                    exact: false,
                })
            }
            Self::Exact(value) if len < *value => Some(IssueKind::TooSmall {
                origin,
                minimum: Bound::Count(*value),
                inclusive: true,
                exact: true,
            }),
            Self::Exact(value) if len > *value => Some(IssueKind::TooBig {
                origin,
                maximum: Bound::Count(*value),
                inclusive: true,
                exact: true,
            }),
            Self::Exact(_) => None,
            Self::Unique => {
                let duplicates = duplicate_positions(items);
                (!duplicates.is_empty()).then_some(IssueKind::NotUnique { origin, duplicates })
            }
        }
    }
}

/// Positions of items equal to an earlier item.
fn duplicate_positions(items: &[Value]) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|&(position, item)| items[..position].contains(item))
        .map(|(position, _)| position)
        .collect()
}
