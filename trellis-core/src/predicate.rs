//! Handler activation predicates.

use crate::{
    error::PatternError,
    message::Routable,
    pattern::PathPattern,
};
use std::{fmt, sync::Arc};

type Condition<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Decides whether a handler applies to an event.
///
/// A predicate always tests the event path against its [`PathPattern`]. An
/// optional condition can inspect the rest of the event (for HTTP, the
/// request method).
pub struct Predicate<E> {
    pattern: PathPattern,
    condition: Option<Condition<E>>,
}

impl<E> Predicate<E> {
    /// A predicate testing only the path.
    pub fn new(pattern: PathPattern) -> Self {
        Self {
            pattern,
            condition: None,
        }
    }

    /// Parse `pattern` with [`PathPattern::parse`].
    pub fn path(pattern: impl Into<String>, prefix: bool) -> Result<Self, PatternError> {
        PathPattern::parse(pattern, prefix).map(Self::new)
    }

    /// The predicate accepting every event.
    pub fn any() -> Self {
        Self::new(PathPattern::any())
    }

    /// Add a condition. Conditions accumulate: all of them must hold.
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
        E: 'static,
    {
        self.condition = Some(match self.condition.take() {
            Some(existing) => Arc::new(move |event: &E| existing(event) && condition(event)),
            None => Arc::new(condition),
        });
        self
    }

    /// The path pattern.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Whether a condition besides the path is attached.
    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    /// Prefix the path pattern, keeping the condition.
    pub fn add_prefix(self, prefix: Option<&PathPattern>) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: self.pattern.add_prefix(prefix)?,
            condition: self.condition,
        })
    }
}

impl<E: Routable> Predicate<E> {
    /// Test the event: path first, then the condition.
    pub fn test(&self, event: &E) -> bool {
        self.pattern.matches(event.path())
            && self.condition.as_ref().is_none_or(|condition| condition(event))
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            condition: self.condition.clone(),
        }
    }
}

impl<E> Default for Predicate<E> {
    fn default() -> Self {
        Self::any()
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("pattern", &self.pattern.pattern())
            .field("prefix", &self.pattern.is_prefix())
            .field("condition", &self.condition.is_some())
            .finish()
    }
}

impl<E> From<PathPattern> for Predicate<E> {
    fn from(pattern: PathPattern) -> Self {
        Self::new(pattern)
    }
}
