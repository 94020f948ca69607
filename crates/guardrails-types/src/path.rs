use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical dotted path into a resource property tree.
///
/// Normalization rules are intentionally simple and deterministic:
/// - segments are separated by `.`
/// - bracket indices are rewritten as segments (`rules[0].action` -> `rules.0.action`)
/// - surrounding whitespace is trimmed
/// - empty paths and empty segments are rejected
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyPath(String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathError {
    Empty,
    EmptySegment { path: String },
    UnbalancedBracket { path: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "property path is empty"),
            PathError::EmptySegment { path } => {
                write!(f, "property path '{path}' contains an empty segment")
            }
            PathError::UnbalancedBracket { path } => {
                write!(f, "property path '{path}' has an unbalanced index bracket")
            }
        }
    }
}

impl std::error::Error for PathError {}

/// A single step in a property path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Key(&'a str),
    Index(usize),
}

impl PropertyPath {
    pub fn new<S: AsRef<str>>(s: S) -> Result<Self, PathError> {
        let raw = s.as_ref().trim();
        if raw.is_empty() {
            return Err(PathError::Empty);
        }

        let mut normalized = String::with_capacity(raw.len());
        let mut in_bracket = false;
        for ch in raw.chars() {
            match ch {
                '[' if !in_bracket => {
                    in_bracket = true;
                    normalized.push('.');
                }
                ']' if in_bracket => in_bracket = false,
                '[' | ']' => {
                    return Err(PathError::UnbalancedBracket {
                        path: raw.to_string(),
                    });
                }
                c => normalized.push(c),
            }
        }
        if in_bracket {
            return Err(PathError::UnbalancedBracket {
                path: raw.to_string(),
            });
        }

        if normalized.split('.').any(|seg| seg.trim().is_empty()) {
            return Err(PathError::EmptySegment {
                path: raw.to_string(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segments in order. Purely numeric segments are array indices, but a
    /// numeric segment is still tried as an object key first when resolving.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').map(str::trim)
    }

    pub fn parse_segment(seg: &str) -> PathSegment<'_> {
        match seg.parse::<usize>() {
            Ok(i) => PathSegment::Index(i),
            Err(_) => PathSegment::Key(seg),
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PropertyPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PropertyPath::new(value)
    }
}

impl TryFrom<&str> for PropertyPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        PropertyPath::new(value)
    }
}

impl From<PropertyPath> for String {
    fn from(value: PropertyPath) -> Self {
        value.0
    }
}
