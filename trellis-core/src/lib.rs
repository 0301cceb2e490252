//! # trellis-core
//!
//! Handler chain engine and path patterns for the Trellis request processing
//! framework.
//!
//! This crate is generic over the event type and knows nothing about HTTP.
//! `trellis-std` builds the HTTP model and routing DSL on top of it.
//!
//! # Building Blocks
//!
//! ## Path Patterns ([`PathPattern`])
//!
//! Match request paths and extract parameters. Literal text, templates with
//! wildcards and `{name}` placeholders, and raw regular expressions.
//!
//! ## Predicates ([`Predicate`])
//!
//! A path pattern plus an optional condition on the event. Every handler
//! carries one; it decides whether the handler applies.
//!
//! ## Context ([`Context`])
//!
//! The copy-on-write state of one request: the event, attributes, a captured
//! exception and the `handled` marker. [`Context::next`] advances it to the
//! next handler that applies.
//!
//! ## Handlers ([`Handler`], [`AsyncHandler`])
//!
//! Closed sets of processing steps (`On`, `After`, `Filter`, `Exception`,
//! `Path`) composed into a tree. The two flavours share selection rules and
//! differ only in how callbacks run.
//!
//! ## Dispatchers ([`Dispatcher`], [`AsyncDispatcher`])
//!
//! Wrap a handler list into a root group and run events through it.
//!
//! # Error Types
//!
//! - [`TrellisError`] - Top-level error type
//! - [`PatternError`] - Malformed patterns, raised while assembling
//! - [`PathError`] - Extraction on a path that does not match
//! - [`HandlerError`] - Callback failures captured into contexts

#![deny(clippy::wildcard_imports)]

mod context;
mod dispatch;
mod error;
mod future;
mod handler;
mod message;
mod pattern;
mod predicate;

// Re-exports
pub use context::{Attributes, Context, Step};
pub use dispatch::{AsyncDispatcher, Dispatcher};
pub use error::{BoxError, Exception, HandlerError, PathError, PatternError, TrellisError};
pub use future::{AsyncCallback, AsyncContext, AsyncHandler, AsyncOutcome};
pub use handler::{Callback, Handler, Matcher, Outcome};
pub use message::{Message, Routable};
pub use pattern::{LiteralPattern, Parameters, PathPattern, RegexPattern, TemplatePattern};
pub use predicate::Predicate;
