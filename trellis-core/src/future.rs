//! # Asynchronous Handler Engine
//!
//! The future based twin of [`Handler`](crate::Handler). Variants and
//! selection rules are identical; callbacks return futures and
//! [`Context::next`] returns a boxed `'static` future.
//!
//! A handler only starts once the previous one resolved. Dropping the outer
//! future drops every pending nested future, so an aborted request never
//! reaches a later handler.

use crate::{
    context::{Context, Step},
    error::{BoxError, Exception, HandlerError, PatternError},
    handler::{Matcher, Outcome},
    message::{Message, Routable},
    pattern::PathPattern,
    predicate::Predicate,
};
use futures::{
    FutureExt,
    future::{self, BoxFuture},
};
use std::{
    fmt,
    future::Future,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

/// A context advanced through [`AsyncHandler`]s.
pub type AsyncContext<E> = Context<E, AsyncHandler<E>>;

/// Result returned by asynchronous callbacks.
pub type AsyncOutcome<E> = Outcome<E, AsyncHandler<E>>;

/// An asynchronous handler callback.
pub type AsyncCallback<E> =
    Arc<dyn Fn(AsyncContext<E>) -> BoxFuture<'static, AsyncOutcome<E>> + Send + Sync>;

/// An asynchronous processing step.
pub enum AsyncHandler<E> {
    /// Await the callback, then continue.
    On {
        predicate: Predicate<E>,
        callback: AsyncCallback<E>,
    },
    /// Continue, then await the callback on the result.
    After {
        predicate: Predicate<E>,
        callback: AsyncCallback<E>,
    },
    /// Hand control to the callback, which decides when to continue.
    Filter {
        predicate: Predicate<E>,
        callback: AsyncCallback<E>,
    },
    /// Continue, then handle a captured failure accepted by `matcher`.
    Exception {
        predicate: Predicate<E>,
        matcher: Matcher,
        callback: AsyncCallback<E>,
        clear: bool,
    },
    /// Run a nested handler group.
    Path {
        predicate: Predicate<E>,
        handlers: Arc<[AsyncHandler<E>]>,
    },
}

fn boxed<E, F, Fut>(callback: F) -> AsyncCallback<E>
where
    E: Message,
    F: Fn(AsyncContext<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AsyncOutcome<E>> + Send + 'static,
{
    Arc::new(move |ctx| callback(ctx).boxed())
}

impl<E: Routable> AsyncHandler<E> {
    pub fn on<F, Fut>(predicate: Predicate<E>, callback: F) -> Self
    where
        F: Fn(AsyncContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AsyncOutcome<E>> + Send + 'static,
    {
        Self::On {
            predicate,
            callback: boxed(callback),
        }
    }

    pub fn after<F, Fut>(predicate: Predicate<E>, callback: F) -> Self
    where
        F: Fn(AsyncContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AsyncOutcome<E>> + Send + 'static,
    {
        Self::After {
            predicate,
            callback: boxed(callback),
        }
    }

    pub fn filter<F, Fut>(predicate: Predicate<E>, callback: F) -> Self
    where
        F: Fn(AsyncContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AsyncOutcome<E>> + Send + 'static,
    {
        Self::Filter {
            predicate,
            callback: boxed(callback),
        }
    }

    /// Handle failures whose error type is `T`, clearing them afterwards.
    pub fn exception<T, F, Fut>(predicate: Predicate<E>, callback: F) -> Self
    where
        T: std::error::Error + 'static,
        F: Fn(AsyncContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AsyncOutcome<E>> + Send + 'static,
    {
        Self::exception_matching(predicate, |e: &Exception| e.is::<T>(), callback, true)
    }

    /// Handle failures accepted by `matcher`.
    pub fn exception_matching<M, F, Fut>(
        predicate: Predicate<E>,
        matcher: M,
        callback: F,
        clear: bool,
    ) -> Self
    where
        M: Fn(&Exception) -> bool + Send + Sync + 'static,
        F: Fn(AsyncContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AsyncOutcome<E>> + Send + 'static,
    {
        Self::Exception {
            predicate,
            matcher: Arc::new(matcher),
            callback: boxed(callback),
            clear,
        }
    }

    /// Group `handlers` under `predicate`, prefixing their patterns.
    pub fn path<I>(predicate: Predicate<E>, handlers: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = AsyncHandler<E>>,
    {
        let handlers = handlers
            .into_iter()
            .map(|handler| handler.add_prefix(Some(predicate.pattern())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Path {
            predicate,
            handlers: handlers.into(),
        })
    }

    /// Prefix this handler's pattern and, for groups, every nested pattern.
    pub fn add_prefix(self, prefix: Option<&PathPattern>) -> Result<Self, PatternError> {
        if prefix.is_none() {
            return Ok(self);
        }
        Ok(match self {
            Self::On {
                predicate,
                callback,
            } => Self::On {
                predicate: predicate.add_prefix(prefix)?,
                callback,
            },
            Self::After {
                predicate,
                callback,
            } => Self::After {
                predicate: predicate.add_prefix(prefix)?,
                callback,
            },
            Self::Filter {
                predicate,
                callback,
            } => Self::Filter {
                predicate: predicate.add_prefix(prefix)?,
                callback,
            },
            Self::Exception {
                predicate,
                matcher,
                callback,
                clear,
            } => Self::Exception {
                predicate: predicate.add_prefix(prefix)?,
                matcher,
                callback,
                clear,
            },
            Self::Path {
                predicate,
                handlers,
            } => Self::Path {
                predicate: predicate.add_prefix(prefix)?,
                handlers: handlers
                    .iter()
                    .cloned()
                    .map(|handler| handler.add_prefix(prefix))
                    .collect::<Result<Vec<_>, _>>()?
                    .into(),
            },
        })
    }

    /// Process a context this handler was selected for.
    pub async fn process(&self, ctx: AsyncContext<E>) -> AsyncContext<E> {
        match self {
            Self::On { callback, .. } => {
                let (Ok(ctx) | Err(ctx)) = invoke(callback, ctx).await;
                ctx.next().await
            }
            Self::After { callback, .. } => {
                let (Ok(ctx) | Err(ctx)) = invoke(callback, ctx.next().await).await;
                ctx
            }
            Self::Filter { callback, .. } => match invoke(callback, ctx).await {
                Ok(ctx) => ctx,
                Err(ctx) => ctx.next().await,
            },
            Self::Exception {
                matcher,
                callback,
                clear,
                ..
            } => {
                let ctx = ctx.next().await;
                if !ctx.exception().is_some_and(|e| matcher(e)) {
                    return ctx;
                }
                match invoke(callback, ctx).await {
                    Ok(ctx) if *clear => ctx.without_exception(),
                    Ok(ctx) | Err(ctx) => ctx,
                }
            }
            Self::Path { handlers, .. } => {
                let mut ctx = ctx;
                let parent = ctx.enter(Arc::clone(handlers));
                ctx.next().await.leave(parent).next().await
            }
        }
    }
}

impl<E> AsyncHandler<E> {
    pub fn predicate(&self) -> &Predicate<E> {
        match self {
            Self::On { predicate, .. }
            | Self::After { predicate, .. }
            | Self::Filter { predicate, .. }
            | Self::Exception { predicate, .. }
            | Self::Path { predicate, .. } => predicate,
        }
    }
}

impl<E: Routable> AsyncContext<E> {
    /// Run the next handler of the current chain that applies.
    pub fn next(mut self) -> BoxFuture<'static, Self> {
        match self.select() {
            Some((handlers, index)) => async move { handlers[index].process(self).await }.boxed(),
            None => future::ready(self).boxed(),
        }
    }
}

/// Await a callback, capturing `Err` and panics (while building the future
/// or while polling it) into the context that went in.
async fn invoke<E: Message>(
    callback: &AsyncCallback<E>,
    ctx: AsyncContext<E>,
) -> Result<AsyncContext<E>, AsyncContext<E>> {
    let fallback = ctx.clone();
    let result = match panic::catch_unwind(AssertUnwindSafe(|| callback(ctx))) {
        Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
        Err(payload) => Err(payload),
    };
    let error: BoxError = match result {
        Ok(Ok(ctx)) => return Ok(ctx),
        Ok(Err(error)) => error,
        Err(payload) => Box::new(HandlerError::from_panic(payload)),
    };
    tracing::debug!(
        pattern = %fallback.predicate().pattern(),
        %error,
        "async handler callback failed"
    );
    Err(fallback.with_exception(error))
}

impl<E: Message> Step<E> for AsyncHandler<E> {
    fn predicate(&self) -> &Predicate<E> {
        AsyncHandler::predicate(self)
    }

    fn runs_on_failure(&self) -> bool {
        !matches!(self, Self::On { .. })
    }
}

impl<E> Clone for AsyncHandler<E> {
    fn clone(&self) -> Self {
        match self {
            Self::On {
                predicate,
                callback,
            } => Self::On {
                predicate: predicate.clone(),
                callback: Arc::clone(callback),
            },
            Self::After {
                predicate,
                callback,
            } => Self::After {
                predicate: predicate.clone(),
                callback: Arc::clone(callback),
            },
            Self::Filter {
                predicate,
                callback,
            } => Self::Filter {
                predicate: predicate.clone(),
                callback: Arc::clone(callback),
            },
            Self::Exception {
                predicate,
                matcher,
                callback,
                clear,
            } => Self::Exception {
                predicate: predicate.clone(),
                matcher: Arc::clone(matcher),
                callback: Arc::clone(callback),
                clear: *clear,
            },
            Self::Path {
                predicate,
                handlers,
            } => Self::Path {
                predicate: predicate.clone(),
                handlers: Arc::clone(handlers),
            },
        }
    }
}

impl<E> fmt::Debug for AsyncHandler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path {
                predicate,
                handlers,
            } => f
                .debug_struct("AsyncHandler::Path")
                .field("predicate", predicate)
                .field("handlers", handlers)
                .finish(),
            other => f
                .debug_tuple("AsyncHandler")
                .field(other.predicate())
                .finish(),
        }
    }
}
