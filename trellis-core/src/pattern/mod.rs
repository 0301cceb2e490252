//! # Path Patterns
//!
//! Matchers and parameter extractors for request paths. Three families exist:
//!
//! - [`LiteralPattern`] - plain text, compared exactly or as a prefix
//! - [`TemplatePattern`] - wildcards (`*`, `**`) and `{name}` placeholders
//! - [`RegexPattern`] - raw regular expressions with named groups
//!
//! [`PathPattern`] wraps the three and is what handlers carry. Patterns are
//! built once when the handler tree is assembled; malformed text is rejected
//! there with a [`PatternError`].
//!
//! ```rust,ignore
//! let pattern = PathPattern::parse("/users/{id}", false)?;
//! assert!(pattern.matches("/users/42"));
//! let params = pattern.extract_parameters("/users/42")?;
//! assert_eq!(params["id"], "42");
//! assert_eq!(params["0"], "42");
//! ```

mod expression;
mod literal;
mod template;

pub use expression::RegexPattern;
pub use literal::LiteralPattern;
pub use template::TemplatePattern;

use crate::error::{PathError, PatternError};
use std::{collections::HashMap, fmt};

/// Values extracted from a path: named parameters plus positional entries
/// (`"0"`, `"1"`, ...) for every capturing group.
pub type Parameters = HashMap<String, String>;

/// A path matcher.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Exact or prefix text comparison.
    Literal(LiteralPattern),
    /// Wildcards and placeholders translated to a regular expression.
    Template(TemplatePattern),
    /// Raw regular expression.
    Regex(RegexPattern),
}

impl PathPattern {
    /// Parse pattern text: a template when it contains `{` or `*`, a literal
    /// otherwise.
    pub fn parse(pattern: impl Into<String>, prefix: bool) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        if pattern.contains(['{', '*']) {
            TemplatePattern::new(pattern, prefix).map(Self::Template)
        } else {
            LiteralPattern::new(pattern, prefix).map(Self::Literal)
        }
    }

    /// Build a regular expression pattern.
    pub fn regex(pattern: impl Into<String>) -> Result<Self, PatternError> {
        RegexPattern::new(pattern).map(Self::Regex)
    }

    /// The pattern matching every path.
    pub const fn any() -> Self {
        Self::Literal(LiteralPattern::any())
    }

    /// The pattern text as declared.
    pub fn pattern(&self) -> &str {
        match self {
            Self::Literal(p) => p.pattern(),
            Self::Template(p) => p.pattern(),
            Self::Regex(p) => p.pattern(),
        }
    }

    /// Whether the pattern matches path prefixes rather than whole paths.
    pub fn is_prefix(&self) -> bool {
        match self {
            Self::Literal(p) => p.is_prefix(),
            Self::Template(p) => p.is_prefix(),
            Self::Regex(p) => p.is_prefix(),
        }
    }

    /// Declared parameter names, in order of occurrence.
    pub fn parameters(&self) -> &[String] {
        match self {
            Self::Literal(_) => &[],
            Self::Template(p) => p.parameters(),
            Self::Regex(p) => p.parameters(),
        }
    }

    /// Whether matching can capture values. Literals never do.
    pub fn has_captures(&self) -> bool {
        match self {
            Self::Literal(_) => false,
            Self::Template(p) => p.group_count() > 0,
            Self::Regex(p) => p.group_count() > 0,
        }
    }

    /// Test a path.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Literal(p) => p.matches(path),
            Self::Template(p) => p.matches(path),
            Self::Regex(p) => p.matches(path),
        }
    }

    /// Extract parameter values.
    ///
    /// # Errors
    ///
    /// [`PathError::InvalidPath`] when the path does not match.
    pub fn extract_parameters(&self, path: &str) -> Result<Parameters, PathError> {
        match self {
            Self::Literal(p) => p.extract_parameters(path),
            Self::Template(p) => p.extract_parameters(path),
            Self::Regex(p) => p.extract_parameters(path),
        }
    }

    /// The pattern for "`prefix` followed by `self`".
    ///
    /// `None` returns `self` untouched. Two non-regex patterns are joined as
    /// text and parsed again with this pattern's prefix flag. If either side
    /// is a regex the two expressions are concatenated instead.
    ///
    /// # Errors
    ///
    /// The combined pattern is validated again, so repeated parameter names
    /// across both sides are reported here.
    pub fn add_prefix(self, prefix: Option<&PathPattern>) -> Result<Self, PatternError> {
        let Some(prefix) = prefix else {
            return Ok(self);
        };

        match (prefix, &self) {
            (Self::Regex(_), _) | (_, Self::Regex(_)) => {
                let anchor = if self.is_prefix() { "" } else { "$" };
                let body = format!(
                    "(?:{})(?:{}){anchor}",
                    prefix.regex_body(),
                    self.regex_body()
                );
                Self::regex(body)
            }
            _ => Self::parse(
                format!("{}{}", prefix.pattern(), self.pattern()),
                self.is_prefix(),
            ),
        }
    }

    fn regex_body(&self) -> String {
        match self {
            Self::Literal(p) => p.body(),
            Self::Template(p) => p.body().to_string(),
            Self::Regex(p) => p.body().to_string(),
        }
    }
}

impl Default for PathPattern {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selects_family() {
        assert!(matches!(
            PathPattern::parse("/users", false).unwrap(),
            PathPattern::Literal(_)
        ));
        assert!(matches!(
            PathPattern::parse("/users/{id}", false).unwrap(),
            PathPattern::Template(_)
        ));
        assert!(matches!(
            PathPattern::parse("/files/*", true).unwrap(),
            PathPattern::Template(_)
        ));
    }

    #[test]
    fn test_users_scenario() {
        let exact = PathPattern::parse("/users/{id}", false).unwrap();
        assert!(exact.matches("/users/42"));
        let params = exact.extract_parameters("/users/42").unwrap();
        assert_eq!(
            params,
            Parameters::from([("id".into(), "42".into()), ("0".into(), "42".into())])
        );
        assert!(!exact.matches("/users/42/extra"));
        assert!(matches!(
            exact.extract_parameters("/users/42/extra"),
            Err(PathError::InvalidPath { .. })
        ));

        let prefix = PathPattern::parse("/users/{id}", true).unwrap();
        assert!(prefix.matches("/users/42/extra"));
    }

    #[test]
    fn test_add_prefix_none_is_identity() {
        let pattern = PathPattern::parse("/a", false).unwrap();
        let same = pattern.add_prefix(None).unwrap();
        assert_eq!(same.pattern(), "/a");
        assert!(!same.is_prefix());
    }

    #[test]
    fn test_add_prefix_textual() {
        let api = PathPattern::parse("/api", true).unwrap();
        let users = PathPattern::parse("/users/{id}", false).unwrap();
        let combined = users.add_prefix(Some(&api)).unwrap();
        assert_eq!(combined.pattern(), "/api/users/{id}");
        assert!(!combined.is_prefix());
        assert!(combined.matches("/api/users/1"));
        assert!(!combined.matches("/users/1"));
    }

    #[test]
    fn test_add_prefix_any_keeps_pattern() {
        let users = PathPattern::parse("/users", false).unwrap();
        let combined = users.add_prefix(Some(&PathPattern::any())).unwrap();
        assert_eq!(combined.pattern(), "/users");
    }

    #[test]
    fn test_add_prefix_regex() {
        let versioned = PathPattern::regex(r"/v(?<version>\d+)").unwrap();
        let users = PathPattern::parse("/users/{id}", false).unwrap();
        let combined = users.add_prefix(Some(&versioned)).unwrap();

        assert!(matches!(combined, PathPattern::Regex(_)));
        assert!(!combined.is_prefix());
        assert_eq!(combined.parameters(), ["version", "id"]);

        let params = combined.extract_parameters("/v2/users/9").unwrap();
        assert_eq!(params["version"], "2");
        assert_eq!(params["id"], "9");
        assert_eq!(params["0"], "2");
        assert_eq!(params["1"], "9");
        assert!(!combined.matches("/v2/users/9/x"));
    }

    #[test]
    fn test_add_prefix_keeps_alternation_scoped() {
        let prefix = PathPattern::parse("/api", true).unwrap();
        let either = PathPattern::regex("(/a|/b)$").unwrap();
        let combined = either.add_prefix(Some(&prefix)).unwrap();
        assert!(combined.matches("/api/a"));
        assert!(combined.matches("/api/b"));
        assert!(!combined.matches("/b"));
    }

    #[test]
    fn test_exact_alternation_agrees_with_empty_prefix() {
        let either = PathPattern::regex("/a|/b$").unwrap();
        let prefixed = either
            .clone()
            .add_prefix(Some(&PathPattern::parse("", true).unwrap()))
            .unwrap();
        for path in ["/a", "/b", "/a/x", "/b/x", "/c"] {
            assert_eq!(either.matches(path), prefixed.matches(path), "{path}");
        }
        assert!(!either.matches("/a/x"));
    }

    #[test]
    fn test_add_prefix_rejects_duplicate_names() {
        let outer = PathPattern::parse("/{id}", true).unwrap();
        let inner = PathPattern::parse("/{id}", false).unwrap();
        assert!(matches!(
            inner.add_prefix(Some(&outer)),
            Err(PatternError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn test_any_is_default() {
        let any = PathPattern::default();
        assert!(any.is_prefix());
        assert!(any.matches("/anything/at/all"));
        assert!(!any.has_captures());
        assert_eq!(any.to_string(), "");
    }
}
