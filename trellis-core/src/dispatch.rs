//! # Dispatchers
//!
//! Entry points running an event through a handler tree. The handlers given
//! at construction are grouped under a root path matching every event; each
//! call starts from a fresh [`Context`].
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new([
//!     Handler::on(Predicate::path("/ping", false)?, |ctx| Ok(ctx.with_handled(true))),
//! ])?;
//!
//! let ctx = dispatcher.process("/ping".to_string());
//! assert!(ctx.is_handled());
//! ```

use crate::{
    context::{Attributes, Context},
    error::{PatternError, TrellisError},
    future::{AsyncContext, AsyncHandler},
    handler::Handler,
    message::Routable,
    predicate::Predicate,
};
use futures::{
    FutureExt,
    future::{self, AbortHandle, Aborted, BoxFuture},
};
use std::{fmt, sync::Arc};

/// Runs events through a blocking handler tree.
pub struct Dispatcher<E> {
    root: Arc<[Handler<E>]>,
}

impl<E: Routable> Dispatcher<E> {
    /// Build a dispatcher. Fails when a nested pattern cannot be prefixed.
    pub fn new<I>(handlers: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = Handler<E>>,
    {
        let root = Handler::path(Predicate::any(), handlers)?;
        Ok(Self {
            root: Arc::from([root]),
        })
    }

    /// Process `event` from a fresh context.
    pub fn process(&self, event: E) -> Context<E> {
        self.process_with(event, Attributes::new())
    }

    /// Process `event` from a context seeded with `attributes`.
    pub fn process_with(&self, event: E, attributes: Attributes) -> Context<E> {
        tracing::trace!(path = event.path(), "dispatching");
        Context::new(event)
            .with_attributes(attributes)
            .with_chain(Arc::clone(&self.root))
            .next()
    }
}

/// Runs events through an asynchronous handler tree.
pub struct AsyncDispatcher<E> {
    root: Arc<[AsyncHandler<E>]>,
}

impl<E: Routable> AsyncDispatcher<E> {
    /// Build a dispatcher. Fails when a nested pattern cannot be prefixed.
    pub fn new<I>(handlers: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = AsyncHandler<E>>,
    {
        let root = AsyncHandler::path(Predicate::any(), handlers)?;
        Ok(Self {
            root: Arc::from([root]),
        })
    }

    /// Process `event` from a fresh context.
    ///
    /// The returned future owns everything it needs; dropping it cancels the
    /// handler currently running and every later one.
    pub fn process(&self, event: E) -> BoxFuture<'static, AsyncContext<E>> {
        self.process_with(event, Attributes::new())
    }

    /// Process `event` from a context seeded with `attributes`.
    pub fn process_with(&self, event: E, attributes: Attributes) -> BoxFuture<'static, AsyncContext<E>> {
        tracing::trace!(path = event.path(), "dispatching");
        AsyncContext::new(event)
            .with_attributes(attributes)
            .with_chain(Arc::clone(&self.root))
            .next()
    }

    /// Like [`process_with`](Self::process_with), with a handle that aborts
    /// the dispatch from elsewhere. An aborted dispatch resolves to
    /// [`TrellisError::Cancelled`].
    pub fn process_abortable(
        &self,
        event: E,
        attributes: Attributes,
    ) -> (
        BoxFuture<'static, Result<AsyncContext<E>, TrellisError>>,
        AbortHandle,
    ) {
        let (dispatch, handle) = future::abortable(self.process_with(event, attributes));
        let dispatch = dispatch
            .map(|result| result.map_err(|Aborted| TrellisError::Cancelled))
            .boxed();
        (dispatch, handle)
    }
}

impl<E> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
        }
    }
}

impl<E> Clone for AsyncDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
        }
    }
}

impl<E> fmt::Debug for Dispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").field("root", &self.root).finish()
    }
}

impl<E> fmt::Debug for AsyncDispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncDispatcher")
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_seeded_attributes_reach_handlers() {
        let dispatcher = Dispatcher::new([Handler::on(Predicate::any(), |ctx: Context<String>| {
            let locale = ctx.attribute::<&str>("locale").copied();
            Ok(ctx.with_attribute("seen", locale == Some("en")))
        })])
        .unwrap();

        let ctx = dispatcher.process_with(
            "/".to_string(),
            Attributes::new().with("locale", "en"),
        );
        assert_eq!(ctx.attribute::<bool>("seen"), Some(&true));
    }

    #[test]
    fn test_unmatched_event_is_returned_untouched() {
        let dispatcher = Dispatcher::new([Handler::on(
            Predicate::path("/only", false).unwrap(),
            |ctx: Context<String>| Ok(ctx.with_handled(true)),
        )])
        .unwrap();

        let ctx = dispatcher.process("/other".to_string());
        assert!(!ctx.is_handled());
        assert!(ctx.exception().is_none());
        assert!(ctx.attributes().is_empty());
        assert_eq!(ctx.event(), "/other");
    }

    #[test]
    fn test_invalid_nested_pattern_fails_at_assembly() {
        let group = Handler::path(
            Predicate::path("/{id}", true).unwrap(),
            [Handler::on(Predicate::any(), |ctx: Context<String>| Ok(ctx))],
        )
        .unwrap();
        let result = Handler::path(Predicate::path("/{id}", true).unwrap(), [group]);
        assert!(matches!(
            result,
            Err(PatternError::DuplicateParameter { .. })
        ));
    }

    #[tokio::test]
    async fn test_abort_resolves_to_cancelled() {
        let dispatcher = AsyncDispatcher::new([AsyncHandler::on(
            Predicate::any(),
            |ctx: AsyncContext<String>| async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(ctx)
            },
        )])
        .unwrap();

        let (dispatch, handle) = dispatcher.process_abortable("/".to_string(), Attributes::new());
        let task = tokio::spawn(dispatch);
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(TrellisError::Cancelled)));
    }

    #[tokio::test]
    async fn test_async_process_completes() {
        let dispatcher = AsyncDispatcher::new([AsyncHandler::on(
            Predicate::path("/ping", false).unwrap(),
            |ctx: AsyncContext<String>| async move { Ok(ctx.with_handled(true)) },
        )])
        .unwrap();

        assert!(dispatcher.process("/ping".to_string()).await.is_handled());
        assert!(!dispatcher.process("/pong".to_string()).await.is_handled());
    }
}
