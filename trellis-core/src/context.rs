//! # Request Context
//!
//! The state carrier threaded through a handler chain. A [`Context`] owns the
//! event, the attributes collected so far, a captured failure if any, and the
//! position in the chain it is being advanced through.
//!
//! Contexts are copy-on-write: every `with_*` method consumes the context and
//! returns the updated one.
//!
//! ```rust,ignore
//! let ctx = ctx
//!     .with_attribute("user", user)
//!     .with_handled(true);
//! ```

use crate::{
    error::{BoxError, Exception},
    handler::Handler,
    message::Routable,
    pattern::Parameters,
    predicate::Predicate,
};
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// Free-form values attached to a context, keyed by name.
#[derive(Clone, Default)]
pub struct Attributes(HashMap<String, Arc<dyn Any + Send + Sync>>);

impl Attributes {
    /// An empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value under `key`.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.0.insert(key.into(), Arc::new(value));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// The value under `key`, if present and of type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.0.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// Whether `key` is present, whatever its type.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key).is_some()
    }

    /// Attribute names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy every entry of `other` into `self`; entries of `other` win.
    pub fn extend(&mut self, other: Attributes) {
        self.0.extend(other.0);
    }

    /// Store extracted path parameters as `String` attributes.
    pub fn merge_parameters(&mut self, parameters: Parameters) {
        for (name, value) in parameters {
            self.insert(name, value);
        }
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.0.keys().collect::<Vec<_>>();
        keys.sort();
        f.debug_set().entries(keys).finish()
    }
}

/// A handler sequence and the position of the next candidate in it.
pub(crate) struct Chain<H> {
    handlers: Arc<[H]>,
    cursor: usize,
    /// The context was already handled when this chain took over, either on
    /// entry or on return from a nested group. Only `On` handlers are
    /// skipped then.
    resumed: bool,
}

impl<H> Chain<H> {
    pub(crate) fn new(handlers: Arc<[H]>) -> Self {
        Self {
            handlers,
            cursor: 0,
            resumed: false,
        }
    }

    fn empty() -> Self {
        Self::new(Arc::from(Vec::new()))
    }
}

impl<H> Clone for Chain<H> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            cursor: self.cursor,
            resumed: self.resumed,
        }
    }
}

/// What the chain walker needs to know about a handler.
pub trait Step<E>: Send + Sync + 'static {
    /// The predicate selecting the events this handler applies to.
    fn predicate(&self) -> &Predicate<E>;

    /// Whether the handler still runs once an exception is captured.
    fn runs_on_failure(&self) -> bool;

    /// Whether the handler answers requests, as opposed to wrapping them.
    fn is_terminal(&self) -> bool {
        !self.runs_on_failure()
    }
}

/// Per-request state flowing through a handler chain.
///
/// `H` is the handler flavour the context advances through: [`Handler`] for
/// the blocking engine, [`AsyncHandler`] for the future based one.
///
/// [`AsyncHandler`]: crate::AsyncHandler
pub struct Context<E, H = Handler<E>> {
    event: E,
    predicate: Predicate<E>,
    attributes: Attributes,
    exception: Option<Exception>,
    handled: bool,
    chain: Chain<H>,
}

impl<E, H> Context<E, H> {
    /// A context for `event` that is not attached to any chain yet.
    pub fn new(event: E) -> Self {
        Self {
            event,
            predicate: Predicate::any(),
            attributes: Attributes::new(),
            exception: None,
            handled: false,
            chain: Chain::empty(),
        }
    }

    /// The event being routed.
    pub fn event(&self) -> &E {
        &self.event
    }

    /// Predicate of the handler currently running.
    pub fn predicate(&self) -> &Predicate<E> {
        &self.predicate
    }

    /// Every attribute collected so far.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Shortcut for `attributes().get(key)`.
    pub fn attribute<T: Any>(&self, key: &str) -> Option<&T> {
        self.attributes.get(key)
    }

    /// A path parameter extracted by an enclosing pattern.
    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.attributes.get::<String>(name).map(String::as_str)
    }

    /// The captured failure, if any.
    pub fn exception(&self) -> Option<&Exception> {
        self.exception.as_ref()
    }

    /// Whether a handler marked the request as answered.
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Give the event back, dropping the rest of the context.
    pub fn into_event(self) -> E {
        self.event
    }

    /// Replace the event.
    pub fn with_event(mut self, event: E) -> Self {
        self.event = event;
        self
    }

    /// Transform the event.
    pub fn map_event(mut self, f: impl FnOnce(E) -> E) -> Self {
        self.event = f(self.event);
        self
    }

    /// Set one attribute.
    pub fn with_attribute<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Merge `attributes` into the current set; the given entries win.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Record a failure.
    pub fn with_exception(mut self, error: impl Into<BoxError>) -> Self {
        self.exception = Some(Exception::from_boxed(error.into()));
        self
    }

    /// Clear the captured failure.
    pub fn without_exception(mut self) -> Self {
        self.exception = None;
        self
    }

    /// Mark the context as handled.
    ///
    /// The rest of the current chain is skipped. Once the enclosing group
    /// returns, its parent carries on with the wrapping handlers (`After`,
    /// `Filter`, `Exception`, `Path`) but never starts another `On` handler.
    pub fn with_handled(mut self, handled: bool) -> Self {
        self.handled = handled;
        self
    }

    pub(crate) fn with_chain(mut self, handlers: Arc<[H]>) -> Self {
        self.chain = Chain::new(handlers);
        self
    }

    /// Attach a nested chain, returning the one it replaces.
    pub(crate) fn enter(&mut self, handlers: Arc<[H]>) -> Chain<H> {
        let mut chain = Chain::new(handlers);
        chain.resumed = self.handled;
        std::mem::replace(&mut self.chain, chain)
    }

    /// Restore the parent chain once a nested group is done.
    pub(crate) fn leave(mut self, mut parent: Chain<H>) -> Self {
        parent.resumed |= self.handled;
        self.chain = parent;
        self
    }
}

impl<E: Routable, H: Step<E>> Context<E, H> {
    /// Move the cursor to the next handler that applies, entering it.
    ///
    /// Entering records the handler predicate and merges the parameters its
    /// pattern extracts from the path. Returns the chain and the index of the
    /// selected handler.
    pub(crate) fn select(&mut self) -> Option<(Arc<[H]>, usize)> {
        let handlers = Arc::clone(&self.chain.handlers);
        if self.handled && !self.chain.resumed {
            self.chain.cursor = handlers.len();
            return None;
        }

        let failed = self.exception.is_some();
        for index in self.chain.cursor..handlers.len() {
            let handler = &handlers[index];
            if failed && !handler.runs_on_failure() {
                continue;
            }
            if self.handled && handler.is_terminal() {
                continue;
            }
            let predicate = handler.predicate();
            if !predicate.test(&self.event) {
                continue;
            }

            let pattern = predicate.pattern();
            if pattern.has_captures() {
                if let Ok(parameters) = pattern.extract_parameters(self.event.path()) {
                    self.attributes.merge_parameters(parameters);
                }
            }
            self.predicate = predicate.clone();
            self.chain.cursor = index + 1;
            return Some((handlers, index));
        }

        self.chain.cursor = handlers.len();
        None
    }
}

impl<E: Clone, H> Clone for Context<E, H> {
    fn clone(&self) -> Self {
        Self {
            event: self.event.clone(),
            predicate: self.predicate.clone(),
            attributes: self.attributes.clone(),
            exception: self.exception.clone(),
            handled: self.handled,
            chain: self.chain.clone(),
        }
    }
}

impl<E: fmt::Debug, H> fmt::Debug for Context<E, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("event", &self.event)
            .field("predicate", &self.predicate)
            .field("attributes", &self.attributes)
            .field("exception", &self.exception)
            .field("handled", &self.handled)
            .field("cursor", &self.chain.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("denied")]
    struct Denied;

    #[test]
    fn test_attributes_typed_access() {
        let attributes = Attributes::new().with("count", 3_u32).with("name", "x");
        assert_eq!(attributes.get::<u32>("count"), Some(&3));
        assert_eq!(attributes.get::<String>("count"), None);
        assert_eq!(attributes.get::<&str>("name"), Some(&"x"));
        assert!(attributes.contains_key("name"));
        assert_eq!(attributes.len(), 2);
    }

    #[test]
    fn test_with_methods_update_fields() {
        let ctx: Context<String> = Context::new("/a".to_string())
            .with_attribute("k", 1_i32)
            .with_exception(Denied)
            .with_handled(true);

        assert!(ctx.is_handled());
        assert!(ctx.exception().is_some_and(|e| e.is::<Denied>()));
        assert_eq!(ctx.attribute::<i32>("k"), Some(&1));

        let ctx = ctx.without_exception().map_event(|path| path + "/b");
        assert!(ctx.exception().is_none());
        assert_eq!(ctx.event(), "/a/b");
    }

    #[test]
    fn test_clone_is_independent() {
        let original: Context<String> = Context::new("/a".to_string());
        let updated = original.clone().with_attribute("k", 1_i32);
        assert!(original.attributes().is_empty());
        assert_eq!(updated.attributes().len(), 1);
    }

    #[test]
    fn test_new_attributes_shadow_old_ones() {
        let ctx: Context<String> = Context::new("/a".to_string())
            .with_attribute("id", "old".to_string())
            .with_attributes(Attributes::new().with("id", "new".to_string()));
        assert_eq!(ctx.path_parameter("id"), Some("new"));
    }

    #[test]
    fn test_exception_from_message() {
        let ctx: Context<String> = Context::new(String::new()).with_exception("plain text");
        assert_eq!(
            ctx.exception().map(ToString::to_string).as_deref(),
            Some("plain text")
        );
    }
}
