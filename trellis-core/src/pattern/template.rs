//! Template path patterns: wildcards and `{name}` placeholders.
//!
//! | Syntax          | Matches                                  | Capture      |
//! |-----------------|------------------------------------------|--------------|
//! | `*`             | any run of characters except `/`         | positional   |
//! | `**`            | any run of characters, `/` included      | positional   |
//! | `{name}`        | one non-empty path segment               | named        |
//! | `{name:regex}`  | whatever `regex` matches                 | named        |
//!
//! Templates are translated once into a [`RegexPattern`] which performs the
//! actual matching.

use super::{Parameters, expression::RegexPattern};
use crate::error::{PathError, PatternError};

const SEGMENT: &str = "[^/]+";

/// A path template translated to an anchored regular expression.
#[derive(Debug, Clone)]
pub struct TemplatePattern {
    pattern: String,
    regex: RegexPattern,
}

impl TemplatePattern {
    /// Translate and compile a template.
    pub fn new(pattern: impl Into<String>, prefix: bool) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        if !pattern.is_empty() && !pattern.starts_with('/') && !pattern.starts_with('*') {
            return Err(PatternError::InvalidPrefix {
                pattern,
                expected: "'/' or '*'",
            });
        }

        let mut body = translate(&pattern)?;
        if !prefix {
            body.push('$');
        }
        let regex = RegexPattern::compile(pattern.clone(), &body)?;
        Ok(Self { pattern, regex })
    }

    /// The template text as declared.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the template matches path prefixes.
    pub fn is_prefix(&self) -> bool {
        self.regex.is_prefix()
    }

    /// Placeholder names in order of occurrence.
    pub fn parameters(&self) -> &[String] {
        self.regex.parameters()
    }

    /// Number of capturing groups (placeholders and wildcards).
    pub fn group_count(&self) -> usize {
        self.regex.group_count()
    }

    /// Test `path` against the translated expression.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.matches(path)
    }

    /// Extract placeholder and wildcard values.
    pub fn extract_parameters(&self, path: &str) -> Result<Parameters, PathError> {
        self.regex.extract_parameters(path)
    }

    pub(crate) fn body(&self) -> &str {
        self.regex.body()
    }
}

fn translate(pattern: &str) -> Result<String, PatternError> {
    let mut body = String::with_capacity(pattern.len() * 2);
    let mut literal = String::new();
    let mut names: Vec<String> = Vec::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                flush(&mut body, &mut literal);
                let placeholder = read_placeholder(pattern, &mut chars)?;
                let (name, constraint) = match placeholder.split_once(':') {
                    Some((name, constraint)) => (name, constraint),
                    None => (placeholder.as_str(), SEGMENT),
                };
                if !is_identifier(name) || constraint.is_empty() {
                    return Err(PatternError::InvalidParameter {
                        pattern: pattern.to_string(),
                        name: placeholder.clone(),
                    });
                }
                if names.iter().any(|n| n == name) {
                    return Err(PatternError::DuplicateParameter {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                body.push_str(&format!("(?P<{name}>{constraint})"));
                names.push(name.to_string());
            }
            '}' => {
                return Err(PatternError::UnbalancedBrace {
                    pattern: pattern.to_string(),
                });
            }
            '*' => {
                flush(&mut body, &mut literal);
                if chars.next_if_eq(&'*').is_some() {
                    if chars.peek() == Some(&'*') {
                        return Err(PatternError::InvalidWildcard {
                            pattern: pattern.to_string(),
                        });
                    }
                    body.push_str("(.*)");
                } else {
                    body.push_str("([^/]*)");
                }
            }
            other => literal.push(other),
        }
    }
    flush(&mut body, &mut literal);
    Ok(body)
}

/// Reads up to the `}` closing the placeholder, allowing nested braces in
/// the constraint (`{code:\d{3}}`).
fn read_placeholder(
    pattern: &str,
    chars: &mut impl Iterator<Item = char>,
) -> Result<String, PatternError> {
    let mut depth = 1;
    let mut placeholder = String::new();
    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(placeholder);
                }
            }
            _ => {}
        }
        placeholder.push(c);
    }
    Err(PatternError::UnbalancedBrace {
        pattern: pattern.to_string(),
    })
}

fn flush(body: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        body.push_str(&regex::escape(literal));
        literal.clear();
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_placeholder() {
        let pattern = TemplatePattern::new("/users/{id}", false).unwrap();
        assert!(pattern.matches("/users/42"));
        assert!(!pattern.matches("/users/42/extra"));
        assert!(!pattern.matches("/users/"));

        let params = pattern.extract_parameters("/users/42").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["id"], "42");
        assert_eq!(params["0"], "42");
    }

    #[test]
    fn test_prefix_placeholder() {
        let pattern = TemplatePattern::new("/users/{id}", true).unwrap();
        assert!(pattern.matches("/users/42/extra"));
        let params = pattern.extract_parameters("/users/42/extra").unwrap();
        assert_eq!(params["id"], "42");
    }

    #[test]
    fn test_typed_placeholder() {
        let pattern = TemplatePattern::new(r"/orders/{id:\d+}", false).unwrap();
        assert!(pattern.matches("/orders/17"));
        assert!(!pattern.matches("/orders/abc"));

        let pattern = TemplatePattern::new(r"/codes/{code:\d{3}}", false).unwrap();
        assert!(pattern.matches("/codes/404"));
        assert!(!pattern.matches("/codes/4040"));
    }

    #[test]
    fn test_wildcards() {
        let single = TemplatePattern::new("/files/*", false).unwrap();
        assert!(single.matches("/files/a.txt"));
        assert!(!single.matches("/files/dir/a.txt"));

        let double = TemplatePattern::new("/files/**", false).unwrap();
        assert!(double.matches("/files/dir/a.txt"));
        let params = double.extract_parameters("/files/dir/a.txt").unwrap();
        assert_eq!(params["0"], "dir/a.txt");
    }

    #[test]
    fn test_mixed_capture_order() {
        let pattern = TemplatePattern::new("/{section}/*/{page}", false).unwrap();
        assert_eq!(pattern.parameters(), ["section", "page"]);
        let params = pattern.extract_parameters("/docs/v2/intro").unwrap();
        assert_eq!(params["section"], "docs");
        assert_eq!(params["page"], "intro");
        assert_eq!(params["0"], "docs");
        assert_eq!(params["1"], "v2");
        assert_eq!(params["2"], "intro");
    }

    #[test]
    fn test_literal_text_is_escaped() {
        let pattern = TemplatePattern::new("/v1.0/{id}", false).unwrap();
        assert!(pattern.matches("/v1.0/7"));
        assert!(!pattern.matches("/v1x0/7"));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            TemplatePattern::new("/users/{id", false),
            Err(PatternError::UnbalancedBrace { .. })
        ));
        assert!(matches!(
            TemplatePattern::new("/users/id}", false),
            Err(PatternError::UnbalancedBrace { .. })
        ));
        assert!(matches!(
            TemplatePattern::new("/users/{}", false),
            Err(PatternError::InvalidParameter { .. })
        ));
        assert!(matches!(
            TemplatePattern::new("/users/{1st}", false),
            Err(PatternError::InvalidParameter { .. })
        ));
        assert!(matches!(
            TemplatePattern::new("/{id}/{id}", false),
            Err(PatternError::DuplicateParameter { .. })
        ));
        assert!(matches!(
            TemplatePattern::new("/***", false),
            Err(PatternError::InvalidWildcard { .. })
        ));
        assert!(matches!(
            TemplatePattern::new("users/{id}", false),
            Err(PatternError::InvalidPrefix { .. })
        ));
    }
}
