use super::Rule;
use crate::issue::{Bound, IssueKind, SizeOrigin, StringFormat};
use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::LazyLock;

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-]+(\.[A-Za-z0-9_'+\-]+)*@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$").ok()
});

static URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").ok());

static CUID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^c[^\s\-]{8,}$").ok());

fn matches(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

/// IP address family accepted by an `ip` check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    V4,
    V6,
}

/// String checks. Lengths count Unicode scalar values.
#[derive(Debug, Clone)]
pub enum StringRule {
    Min(usize),
    Max(usize),
    Length(usize),
    Email,
    Url,
    Uuid,
    Cuid,
    Regex(Regex),
    Includes(String),
    StartsWith(String),
    EndsWith(String),
    /// RFC 3339 timestamp; `offset: false` requires the `Z` suffix
    Datetime { offset: bool },
    Ip(Option<IpVersion>),
}

impl Rule for StringRule {
    fn name(&self) -> &'static str {
        match self {
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::Length(_) => "length",
            Self::Email => "email",
            Self::Url => "url",
            Self::Uuid => "uuid",
            Self::Cuid => "cuid",
            Self::Regex(_) => "regex",
            Self::Includes(_) => "includes",
            Self::StartsWith(_) => "starts_with",
            Self::EndsWith(_) => "ends_with",
            Self::Datetime { .. } => "datetime",
            Self::Ip(_) => "ip",
        }
    }

    fn supersedes(&self, existing: &Self) -> bool {
        match (self, existing) {
            (Self::Regex(_), _) | (Self::Includes(_), _) => false,
            (Self::Length(_), Self::Min(_) | Self::Max(_) | Self::Length(_)) => true,
            (Self::Min(_), Self::Length(_)) | (Self::Max(_), Self::Length(_)) => true,
            _ => self.name() == existing.name(),
        }
    }
}

impl StringRule {
    pub(crate) fn violation(&self, value: &str) -> Option<IssueKind> {
        let invalid = |validation, detail: Option<&str>| IssueKind::InvalidString {
            validation,
            detail: detail.map(str::to_string),
        };
        match self {
            Self::Min(min) => (value.chars().count() < *min).then(|| IssueKind::TooSmall {
                origin: SizeOrigin::String,
                minimum: Bound::Count(*min),
                inclusive: true,
                exact: false,
            }),
            Self::Max(max) => (value.chars().count() > *max).then(|| IssueKind::TooBig {
                origin: SizeOrigin::String,
                maximum: Bound::Count(*max),
                inclusive: true,
                exact: false,
            }),
            Self::Length(length) => {
                let count = value.chars().count();
                if count < *length {
                    Some(IssueKind::TooSmall {
                        origin: SizeOrigin::String,
                        minimum: Bound::Count(*length),
                        inclusive: true,
                        exact: true,
                    })
                } else if count > *length {
                    Some(IssueKind::TooBig {
                        origin: SizeOrigin::String,
                        maximum: Bound::Count(*length),
                        inclusive: true,
                        exact: true,
                    })
                } else {
                    None
                }
            }
            Self::Email => (!matches(&EMAIL, value)).then(|| invalid(StringFormat::Email, None)),
            Self::Url => (!matches(&URL, value)).then(|| invalid(StringFormat::Url, None)),
            Self::Uuid => (!is_uuid(value)).then(|| invalid(StringFormat::Uuid, None)),
            Self::Cuid => (!matches(&CUID, value)).then(|| invalid(StringFormat::Cuid, None)),
            Self::Regex(pattern) => (!pattern.is_match(value))
                .then(|| invalid(StringFormat::Regex, Some(pattern.as_str()))),
            Self::Includes(needle) => (!value.contains(needle.as_str()))
                .then(|| invalid(StringFormat::Includes, Some(needle.as_str()))),
            Self::StartsWith(prefix) => (!value.starts_with(prefix.as_str()))
                .then(|| invalid(StringFormat::StartsWith, Some(prefix.as_str()))),
            Self::EndsWith(suffix) => (!value.ends_with(suffix.as_str()))
                .then(|| invalid(StringFormat::EndsWith, Some(suffix.as_str()))),
            Self::Datetime { offset } => (!is_datetime(value, *offset))
                .then(|| invalid(StringFormat::Datetime, None)),
            Self::Ip(version) => (!is_ip(value, *version)).then(|| invalid(StringFormat::Ip, None)),
        }
    }
}

fn is_uuid(value: &str) -> bool {
    // hyphenated form only
    value.len() == 36 && uuid::Uuid::try_parse(value).is_ok()
}

fn is_datetime(value: &str, offset: bool) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        && (offset || value.ends_with('Z') || value.ends_with('z'))
}

fn is_ip(value: &str, version: Option<IpVersion>) -> bool {
    match (value.parse::<IpAddr>(), version) {
        (Ok(IpAddr::V4(_)), None | Some(IpVersion::V4)) => true,
        (Ok(IpAddr::V6(_)), None | Some(IpVersion::V6)) => true,
        _ => false,
    }
}
