//! Value paths
//!
//! A [`Path`] locates a value inside the original input as a sequence of
//! property keys and positional indices. Paths render and parse in the usual
//! dot/bracket notation: `user.addresses[0].city`, with quoted brackets for
//! keys that are not plain identifiers (`headers["content-type"]`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One step into a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object property
    Key(String),
    /// Array, tuple or set position
    Index(usize),
}

impl PathSegment {
    /// The segment as an object key. Indices render as decimal strings.
    pub fn as_key(&self) -> String {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(index) => index.to_string(),
        }
    }

    /// The segment as a position, if it is one or a key spelling one.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Key(key) => key.parse().ok(),
            Self::Index(index) => Some(*index),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<&String> for PathSegment {
    fn from(key: &String) -> Self {
        Self::Key(key.clone())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Error raised when a dot/bracket path string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("path is empty")]
    Empty,

    #[error("empty segment at position {position} in '{path}'")]
    EmptySegment { path: String, position: usize },

    #[error("unclosed '[' at position {position} in '{path}'")]
    UnclosedBracket { path: String, position: usize },

    #[error("invalid bracket segment '[{segment}]' in '{path}'")]
    InvalidBracket { path: String, segment: String },

    #[error("unexpected character '{ch}' at position {position} in '{path}'")]
    UnexpectedChar {
        path: String,
        ch: char,
        position: usize,
    },
}

/// A sequence of path segments from the root of the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        Self(segments.into_iter().collect())
    }

    /// Parse dot/bracket notation.
    pub fn parse(input: &str) -> Result<Self, PathParseError> {
        Parser::new(input).run()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathSegment> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&PathSegment> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// A new path with one more segment.
    #[must_use = "This method returns a new Path and does not modify self"]
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment.into());
        Self(segments)
    }

    /// A new path with all segments of `suffix` appended.
    #[must_use = "This method returns a new Path and does not modify self"]
    pub fn join(&self, suffix: &Path) -> Self {
        let mut segments = self.0.clone();
        segments.extend_from_slice(&suffix.0);
        Self(segments)
    }

    /// Split into the first segment and the remaining path.
    pub fn split_first(&self) -> Option<(&PathSegment, Path)> {
        self.0
            .split_first()
            .map(|(head, tail)| (head, Path(tail.to_vec())))
    }

    /// True if `prefix` is a (non-strict) prefix of this path.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
                PathSegment::Key(key) if is_identifier(key) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Key(key) => write!(f, "[{:?}]", key)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<T: IntoIterator<Item = PathSegment>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn is_identifier(key: &str) -> bool {
    !key.is_empty() && !key.contains(['.', '[', ']', '"', '\''])
}

// =============================================================================
// Parser
// =============================================================================

#[derive(Clone, Copy, PartialEq)]
enum Expect {
    /// Nothing consumed yet
    Start,
    /// Just consumed a '.'
    Key,
    /// Just consumed a segment
    Separator,
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
    segments: Vec<PathSegment>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
            segments: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Path, PathParseError> {
        let mut expect = Expect::Start;
        while let Some(&ch) = self.chars.get(self.pos) {
            expect = match (expect, ch) {
                (Expect::Start | Expect::Key, '.') => return Err(self.empty_segment()),
                (Expect::Key, '[') => return Err(self.empty_segment()),
                (Expect::Separator, '.') => {
                    self.pos += 1;
                    Expect::Key
                }
                (Expect::Start | Expect::Separator, '[') => {
                    self.bracket()?;
                    Expect::Separator
                }
                (Expect::Start | Expect::Key, ']') | (Expect::Separator, _) => {
                    return Err(PathParseError::UnexpectedChar {
                        path: self.input.to_string(),
                        ch,
                        position: self.pos,
                    });
                }
                (Expect::Start | Expect::Key, _) => {
                    self.key();
                    Expect::Separator
                }
            };
        }
        match expect {
            Expect::Start => Err(PathParseError::Empty),
            Expect::Key => Err(self.empty_segment()),
            Expect::Separator => Ok(Path(self.segments)),
        }
    }

    fn key(&mut self) {
        let start = self.pos;
        while let Some(&ch) = self.chars.get(self.pos) {
            if matches!(ch, '.' | '[' | ']') {
                break;
            }
            self.pos += 1;
        }
        let key: String = self.chars[start..self.pos].iter().collect();
        self.segments.push(PathSegment::Key(key));
    }

    fn bracket(&mut self) -> Result<(), PathParseError> {
        let open = self.pos;
        let close = self.chars[open..]
            .iter()
            .position(|&c| c == ']')
            .map(|offset| open + offset)
            .ok_or_else(|| PathParseError::UnclosedBracket {
                path: self.input.to_string(),
                position: open,
            })?;
        let inner: String = self.chars[open + 1..close].iter().collect();
        self.pos = close + 1;

        let quoted = ['"', '\''].into_iter().find(|&q| {
            inner.len() >= 2 && inner.starts_with(q) && inner.ends_with(q)
        });
        let segment = match quoted {
            Some(q) => PathSegment::Key(inner.trim_matches(q).to_string()),
            None => inner
                .trim()
                .parse::<usize>()
                .map(PathSegment::Index)
                .map_err(|_| PathParseError::InvalidBracket {
                    path: self.input.to_string(),
                    segment: inner.clone(),
                })?,
        };
        self.segments.push(segment);
        Ok(())
    }

    fn empty_segment(&self) -> PathParseError {
        PathParseError::EmptySegment {
            path: self.input.to_string(),
            position: self.pos,
        }
    }
}
