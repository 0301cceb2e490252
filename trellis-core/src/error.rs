//! Error types for Trellis.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`TrellisError`] - Top-level error type for dispatch results
//! - [`PatternError`] - Malformed path patterns, raised at assembly time
//! - [`PathError`] - Parameter extraction on a path that does not match
//! - [`HandlerError`] - Failures produced while running a callback
//!
//! Callback failures never travel up the call stack: they are captured into
//! the context as an [`Exception`] and only surface as
//! [`TrellisError::Unresolved`] when nothing in the chain dealt with them.

use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Trellis operations.
#[derive(Error, Debug)]
pub enum TrellisError {
    /// A path pattern could not be built.
    #[error("invalid path pattern: {0}")]
    Pattern(#[from] PatternError),

    /// Parameters were extracted from a path the pattern does not match.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A captured exception reached the outermost chain boundary.
    #[error("unresolved exception: {0}")]
    Unresolved(#[source] Exception),

    /// The chain completed without producing a response.
    #[error("no handler produced a response")]
    NoResponse,

    /// The dispatch future was aborted before completion.
    #[error("dispatch was cancelled")]
    Cancelled,

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised while building a path pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern does not start with an accepted prefix.
    #[error("'{pattern}' must be empty or start with {expected}")]
    InvalidPrefix {
        /// The offending pattern.
        pattern: String,
        /// Human readable list of accepted starts.
        expected: &'static str,
    },

    /// A regex pattern starts with a quantifier, so its anchoring is ambiguous.
    #[error("'{pattern}' starts with the quantifier '{quantifier}'")]
    QuantifierPrefix {
        /// The offending pattern.
        pattern: String,
        /// The leading quantifier.
        quantifier: char,
    },

    /// The regular expression does not compile.
    #[error("'{pattern}' is not a valid regular expression: {reason}")]
    InvalidRegex {
        /// The offending pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A `{` has no matching `}` or the other way round.
    #[error("'{pattern}' has unbalanced braces")]
    UnbalancedBrace {
        /// The offending pattern.
        pattern: String,
    },

    /// A placeholder name is empty or not an identifier.
    #[error("'{pattern}' declares an invalid parameter name '{name}'")]
    InvalidParameter {
        /// The offending pattern.
        pattern: String,
        /// The rejected name.
        name: String,
    },

    /// The same parameter name is declared twice.
    #[error("'{pattern}' declares parameter '{name}' more than once")]
    DuplicateParameter {
        /// The offending pattern.
        pattern: String,
        /// The repeated name.
        name: String,
    },

    /// More than two consecutive `*`.
    #[error("'{pattern}' contains an invalid wildcard run")]
    InvalidWildcard {
        /// The offending pattern.
        pattern: String,
    },
}

/// Errors raised when using a pattern against a path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// `extract_parameters` was called with a path that does not match.
    #[error("path '{path}' does not match pattern '{pattern}'")]
    InvalidPath {
        /// The request path.
        path: String,
        /// The pattern text.
        pattern: String,
    },
}

/// Errors produced while executing a handler callback.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The callback panicked.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// The callback did not finish in time.
    #[error("handler timed out after {0:?}")]
    Timeout(Duration),

    /// A custom handler error.
    #[error(transparent)]
    Custom(BoxError),
}

impl HandlerError {
    /// Build a [`HandlerError::Panic`] from a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "unknown panic payload".to_string()
        };
        HandlerError::Panic(message)
    }
}

/// A captured callback failure stored in a [`Context`].
///
/// Cloning is cheap: the underlying error is shared.
///
/// [`Context`]: crate::Context
#[derive(Clone)]
pub struct Exception(Arc<dyn std::error::Error + Send + Sync + 'static>);

impl Exception {
    /// Wrap an error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Wrap a boxed error. An already wrapped `Exception` is not nested again.
    pub fn from_boxed(error: BoxError) -> Self {
        match error.downcast::<Exception>() {
            Ok(exception) => *exception,
            Err(error) => Self(Arc::from(error)),
        }
    }

    /// Returns the inner error as `T` if that is its concrete type.
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: std::error::Error + 'static,
    {
        self.0.downcast_ref::<T>()
    }

    /// Returns true if the inner error is a `T`.
    pub fn is<T>(&self) -> bool
    where
        T: std::error::Error + 'static,
    {
        self.0.is::<T>()
    }

    /// Borrow the inner error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Exception {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<BoxError> for Exception {
    fn from(error: BoxError) -> Self {
        Exception::from_boxed(error)
    }
}

impl From<HandlerError> for Exception {
    fn from(error: HandlerError) -> Self {
        Exception::new(error)
    }
}

// Convenience conversions
impl From<BoxError> for TrellisError {
    fn from(err: BoxError) -> Self {
        TrellisError::Custom(err)
    }
}

impl From<BoxError> for HandlerError {
    fn from(err: BoxError) -> Self {
        HandlerError::Custom(err)
    }
}
