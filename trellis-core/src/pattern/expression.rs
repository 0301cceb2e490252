//! Regular expression path patterns.

use super::Parameters;
use crate::error::{PathError, PatternError};
use regex::Regex;

/// A path pattern backed by a raw regular expression.
///
/// The expression is always anchored at the start of the path. It matches as
/// a prefix unless it ends with an unescaped `$`. Named groups (`(?<name>..)`
/// or `(?P<name>..)`) become the declared parameters.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    pattern: String,
    body: String,
    prefix: bool,
    parameters: Vec<String>,
    regex: Regex,
}

impl RegexPattern {
    /// Compile a regex pattern.
    ///
    /// A leading `^` is accepted. After it the expression must be empty, `$`,
    /// or start with `/` or `(`.
    pub fn new(pattern: impl Into<String>) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        let body = strip_start_anchor(&pattern).to_string();
        check_start(&pattern, &body)?;
        Self::compile(pattern, &body)
    }

    /// Compile an already validated body, keeping `pattern` as the display text.
    pub(crate) fn compile(pattern: String, body: &str) -> Result<Self, PatternError> {
        let prefix = !ends_with_anchor(body);
        let body = if prefix {
            body.to_string()
        } else {
            body[..body.len() - 1].to_string()
        };
        // Exact patterns must consume the whole path, alternations included.
        let anchored = if prefix {
            format!("^(?:{body})")
        } else {
            format!("^(?:{body})$")
        };
        let regex = Regex::new(&anchored).map_err(|e| PatternError::InvalidRegex {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        let parameters = regex
            .capture_names()
            .flatten()
            .map(str::to_string)
            .collect::<Vec<_>>();

        tracing::trace!(%pattern, prefix, ?parameters, "compiled path expression");

        Ok(Self {
            pattern,
            body,
            prefix,
            parameters,
            regex,
        })
    }

    /// The pattern text as declared.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern matches path prefixes.
    pub fn is_prefix(&self) -> bool {
        self.prefix
    }

    /// Named parameters in order of occurrence.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Number of capturing groups, not counting the implicit whole match.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Test `path` against the expression.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Extract named and positional captures from a matching path.
    pub fn extract_parameters(&self, path: &str) -> Result<Parameters, PathError> {
        let captures = self
            .regex
            .captures(path)
            .ok_or_else(|| PathError::InvalidPath {
                path: path.to_string(),
                pattern: self.pattern.clone(),
            })?;

        let mut values = Parameters::with_capacity(self.parameters.len() + captures.len());
        for (index, group) in captures.iter().skip(1).enumerate() {
            let value = group.map_or("", |m| m.as_str());
            values.insert(index.to_string(), value.to_string());
        }
        // Named values win over positional keys.
        for name in &self.parameters {
            let value = captures.name(name).map_or("", |m| m.as_str());
            values.insert(name.clone(), value.to_string());
        }
        Ok(values)
    }

    /// The expression without its start and end anchors.
    pub(crate) fn body(&self) -> &str {
        &self.body
    }
}

fn strip_start_anchor(pattern: &str) -> &str {
    pattern.strip_prefix('^').unwrap_or(pattern)
}

fn ends_with_anchor(body: &str) -> bool {
    let Some(rest) = body.strip_suffix('$') else {
        return false;
    };
    let escapes = rest.chars().rev().take_while(|c| *c == '\\').count();
    escapes % 2 == 0
}

fn check_start(pattern: &str, body: &str) -> Result<(), PatternError> {
    if body.is_empty() || body == "$" || body.starts_with('/') || body.starts_with('(') {
        return Ok(());
    }
    match body.chars().next() {
        Some(quantifier @ ('*' | '+' | '?' | '{')) => Err(PatternError::QuantifierPrefix {
            pattern: pattern.to_string(),
            quantifier,
        }),
        _ => Err(PatternError::InvalidPrefix {
            pattern: pattern.to_string(),
            expected: "'/', '(' or '^'",
        }),
    }
}
