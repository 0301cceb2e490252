//! Literal path patterns.

use super::Parameters;
use crate::error::{PathError, PatternError};

/// A pattern compared character by character against the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralPattern {
    pattern: String,
    prefix: bool,
}

impl LiteralPattern {
    /// Create a literal pattern. The text must be empty or start with `/`.
    pub fn new(pattern: impl Into<String>, prefix: bool) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        if !pattern.is_empty() && !pattern.starts_with('/') {
            return Err(PatternError::InvalidPrefix {
                pattern,
                expected: "'/'",
            });
        }
        Ok(Self { pattern, prefix })
    }

    /// The empty prefix pattern: matches every path.
    pub const fn any() -> Self {
        Self {
            pattern: String::new(),
            prefix: true,
        }
    }

    /// The pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern matches path prefixes.
    pub fn is_prefix(&self) -> bool {
        self.prefix
    }

    /// Exact comparison, or `starts_with` for prefix patterns.
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix {
            path.starts_with(&self.pattern)
        } else {
            path == self.pattern
        }
    }

    /// Literal patterns declare no parameters; this only validates the path.
    pub fn extract_parameters(&self, path: &str) -> Result<Parameters, PathError> {
        if self.matches(path) {
            Ok(Parameters::new())
        } else {
            Err(PathError::InvalidPath {
                path: path.to_string(),
                pattern: self.pattern.clone(),
            })
        }
    }

    /// The pattern as an unanchored regular expression.
    pub(crate) fn body(&self) -> String {
        regex::escape(&self.pattern)
    }
}
