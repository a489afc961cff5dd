//! Checks
//!
//! A check is one constraint on an already type-checked value: a minimum
//! length, a regex, a numeric bound. Each schema kind that supports checks
//! keeps an ordered [`CheckList`] of its own rule type.
//!
//! Adding a check removes the checks it supersedes: a second `min` replaces
//! the first, and `length` replaces both `min` and `max`. Checks are evaluated
//! in list order. Under abort-early the first failing check ends evaluation;
//! otherwise every check reports.

mod bigint;
mod date;
mod number;
mod size;
mod string;

pub use bigint::BigIntRule;
pub use date::DateRule;
pub use number::NumberRule;
pub use size::SizeRule;
pub use string::{IpVersion, StringRule};

use crate::config::SchemaOptions;
use crate::context::ParseContext;
use crate::issue::IssueKind;
use std::fmt;

/// A family of checks for one value type.
pub trait Rule: Clone + fmt::Debug + Send + Sync {
    /// Name used by `has_check`, `get_checks`, `disable_check`, ...
    fn name(&self) -> &'static str;

    /// Whether adding `self` removes `existing`. By default a check replaces
    /// checks of the same name.
    fn supersedes(&self, existing: &Self) -> bool {
        self.name() == existing.name()
    }
}

/// A rule with an optional message override.
#[derive(Debug, Clone)]
pub struct Check<R> {
    pub rule: R,
    pub message: Option<String>,
    pub enabled: bool,
}

impl<R: Rule> Check<R> {
    pub fn new(rule: R) -> Self {
        Self {
            rule,
            message: None,
            enabled: true,
        }
    }

    #[must_use = "This method returns a new Check and does not modify self"]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.rule.name()
    }
}

/// Ordered checks of one schema node.
#[derive(Debug, Clone)]
pub struct CheckList<R> {
    checks: Vec<Check<R>>,
}

impl<R> Default for CheckList<R> {
    fn default() -> Self {
        Self { checks: Vec::new() }
    }
}

impl<R: Rule> CheckList<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a check, dropping the checks it supersedes.
    pub fn add(&mut self, check: Check<R>) {
        self.checks
            .retain(|existing| !check.rule.supersedes(&existing.rule));
        self.checks.push(check);
    }

    /// True if an enabled check with this name exists.
    pub fn has(&self, name: &str) -> bool {
        self.active().any(|check| check.name() == name)
    }

    /// Checks whose name is in `names`, in list order. Disabled checks are
    /// included.
    pub fn get(&self, names: &[&str]) -> Vec<&Check<R>> {
        self.checks
            .iter()
            .filter(|check| names.contains(&check.name()))
            .collect()
    }

    /// Enable or disable every check with this name. Returns how many
    /// checks were touched.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> usize {
        let mut touched = 0;
        for check in self.checks.iter_mut().filter(|c| c.name() == name) {
            check.enabled = enabled;
            touched += 1;
        }
        touched
    }

    pub fn iter(&self) -> impl Iterator<Item = &Check<R>> {
        self.checks.iter()
    }

    /// Enabled checks in list order.
    pub fn active(&self) -> impl Iterator<Item = &Check<R>> {
        self.checks.iter().filter(|check| check.enabled)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Run the enabled checks against a value.
///
/// `violation` maps a rule to the issue it raises, if any. Returns true when
/// every evaluated check passed.
pub(crate) fn evaluate<R, F>(
    checks: &CheckList<R>,
    ctx: &ParseContext,
    options: &SchemaOptions,
    mut violation: F,
) -> bool
where
    R: Rule,
    F: FnMut(&R) -> Option<IssueKind>,
{
    let mut valid = true;
    for check in checks.active() {
        if let Some(kind) = violation(&check.rule) {
            ctx.add_issue(options, kind, check.message.as_deref());
            valid = false;
            if ctx.should_abort() {
                break;
            }
        }
    }
    valid
}

/// Builder methods shared by every schema with a check list.
macro_rules! check_methods {
    ($rule:ty) => {
        /// Append a check, removing the checks it supersedes.
        #[must_use = "This method returns a new schema and does not modify self"]
        pub fn add_check(mut self, check: $crate::checks::Check<$rule>) -> Self {
            self.checks.add(check);
            self
        }

        /// True if an enabled check with this name exists.
        pub fn has_check(&self, name: &str) -> bool {
            self.checks.has(name)
        }

        /// Checks with any of the given names, in evaluation order.
        pub fn get_checks(&self, names: &[&str]) -> Vec<&$crate::checks::Check<$rule>> {
            self.checks.get(names)
        }

        /// Skip every check with this name.
        #[must_use = "This method returns a new schema and does not modify self"]
        pub fn disable_check(mut self, name: &str) -> Self {
            self.checks.set_enabled(name, false);
            self
        }

        /// Re-enable every check with this name.
        #[must_use = "This method returns a new schema and does not modify self"]
        pub fn enable_check(mut self, name: &str) -> Self {
            self.checks.set_enabled(name, true);
            self
        }

        pub fn checks(&self) -> &$crate::checks::CheckList<$rule> {
            &self.checks
        }

        fn rule(mut self, rule: $rule) -> Self {
            self.checks.add($crate::checks::Check::new(rule));
            self
        }
    };
}

pub(crate) use check_methods;
