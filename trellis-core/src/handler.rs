//! # Blocking Handler Engine
//!
//! [`Handler`] is a closed set of processing steps. A handler tree is built
//! once and shared by every request; a [`Context`] walks it with
//! [`Context::next`].
//!
//! | Variant     | Runs                                                        |
//! |-------------|-------------------------------------------------------------|
//! | `On`        | callback, then the rest of the chain                        |
//! | `After`     | the rest of the chain, then the callback                    |
//! | `Filter`    | callback only; it calls `next()` itself                     |
//! | `Exception` | the rest of the chain, then the callback if the error fits  |
//! | `Path`      | nested handlers, then the rest of the parent chain          |
//!
//! Callback failures never escape a handler. An `Err` or a panic is recorded
//! in the context that went into the callback, and that context continues.
//! While an exception is recorded `On` handlers are skipped; every other
//! variant still runs so error mapping and cleanup declared later apply.

use crate::{
    context::{Context, Step},
    error::{BoxError, Exception, HandlerError, PatternError},
    message::{Message, Routable},
    pattern::PathPattern,
    predicate::Predicate,
};
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

/// Result returned by handler callbacks.
pub type Outcome<E, H = Handler<E>> = Result<Context<E, H>, BoxError>;

/// A blocking handler callback.
pub type Callback<E> = Arc<dyn Fn(Context<E>) -> Outcome<E> + Send + Sync>;

/// Decides whether an exception handler applies to a captured failure.
pub type Matcher = Arc<dyn Fn(&Exception) -> bool + Send + Sync>;

/// A blocking processing step.
pub enum Handler<E> {
    /// Run the callback, then continue.
    On {
        predicate: Predicate<E>,
        callback: Callback<E>,
    },
    /// Continue, then run the callback on the result.
    After {
        predicate: Predicate<E>,
        callback: Callback<E>,
    },
    /// Hand control to the callback, which decides when to continue.
    Filter {
        predicate: Predicate<E>,
        callback: Callback<E>,
    },
    /// Continue, then handle a captured failure accepted by `matcher`.
    Exception {
        predicate: Predicate<E>,
        matcher: Matcher,
        callback: Callback<E>,
        clear: bool,
    },
    /// Run a nested handler group.
    Path {
        predicate: Predicate<E>,
        handlers: Arc<[Handler<E>]>,
    },
}

impl<E: Routable> Handler<E> {
    pub fn on<F>(predicate: Predicate<E>, callback: F) -> Self
    where
        F: Fn(Context<E>) -> Outcome<E> + Send + Sync + 'static,
    {
        Self::On {
            predicate,
            callback: Arc::new(callback),
        }
    }

    pub fn after<F>(predicate: Predicate<E>, callback: F) -> Self
    where
        F: Fn(Context<E>) -> Outcome<E> + Send + Sync + 'static,
    {
        Self::After {
            predicate,
            callback: Arc::new(callback),
        }
    }

    pub fn filter<F>(predicate: Predicate<E>, callback: F) -> Self
    where
        F: Fn(Context<E>) -> Outcome<E> + Send + Sync + 'static,
    {
        Self::Filter {
            predicate,
            callback: Arc::new(callback),
        }
    }

    /// Handle failures whose error type is `T`, clearing them afterwards.
    ///
    /// Panics are captured as [`HandlerError::Panic`], so
    /// `exception::<HandlerError>` also observes them.
    pub fn exception<T, F>(predicate: Predicate<E>, callback: F) -> Self
    where
        T: std::error::Error + 'static,
        F: Fn(Context<E>) -> Outcome<E> + Send + Sync + 'static,
    {
        Self::exception_matching(predicate, |e: &Exception| e.is::<T>(), callback, true)
    }

    /// Handle failures accepted by `matcher`. With `clear` unset the
    /// exception stays recorded after the callback succeeds.
    pub fn exception_matching<M, F>(
        predicate: Predicate<E>,
        matcher: M,
        callback: F,
        clear: bool,
    ) -> Self
    where
        M: Fn(&Exception) -> bool + Send + Sync + 'static,
        F: Fn(Context<E>) -> Outcome<E> + Send + Sync + 'static,
    {
        Self::Exception {
            predicate,
            matcher: Arc::new(matcher),
            callback: Arc::new(callback),
            clear,
        }
    }

    /// Group `handlers` under `predicate`.
    ///
    /// The predicate pattern is prepended to every nested pattern here, so a
    /// nested handler matches exactly the paths the combined pattern matches.
    pub fn path<I>(predicate: Predicate<E>, handlers: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = Handler<E>>,
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
    pub fn process(&self, ctx: Context<E>) -> Context<E> {
        match self {
            Self::On { callback, .. } => {
                let (Ok(ctx) | Err(ctx)) = invoke(callback, ctx);
                ctx.next()
            }
            Self::After { callback, .. } => {
                let (Ok(ctx) | Err(ctx)) = invoke(callback, ctx.next());
                ctx
            }
            Self::Filter { callback, .. } => invoke(callback, ctx).unwrap_or_else(|ctx| ctx.next()),
            Self::Exception {
                matcher,
                callback,
                clear,
                ..
            } => {
                let ctx = ctx.next();
                if !ctx.exception().is_some_and(|e| matcher(e)) {
                    return ctx;
                }
                match invoke(callback, ctx) {
                    Ok(ctx) if *clear => ctx.without_exception(),
                    Ok(ctx) | Err(ctx) => ctx,
                }
            }
            Self::Path { handlers, .. } => {
                let mut ctx = ctx;
                let parent = ctx.enter(Arc::clone(handlers));
                ctx.next().leave(parent).next()
            }
        }
    }
}

impl<E> Handler<E> {
    pub fn predicate(&self) -> &Predicate<E> {
        match self {
            Self::On { predicate, .. }
            | Self::After { predicate, .. }
            | Self::Filter { predicate, .. }
            | Self::Exception { predicate, .. }
            | Self::Path { predicate, .. } => predicate,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::On { .. } => "on",
            Self::After { .. } => "after",
            Self::Filter { .. } => "filter",
            Self::Exception { .. } => "exception",
            Self::Path { .. } => "path",
        }
    }
}

impl<E: Routable> Context<E> {
    /// Run the next handler of the current chain that applies.
    ///
    /// Returns the context unchanged when none is left or the context is
    /// handled.
    pub fn next(mut self) -> Self {
        match self.select() {
            Some((handlers, index)) => handlers[index].process(self),
            None => self,
        }
    }
}

/// Run a callback, capturing `Err` and panics into the context that went in.
fn invoke<E: Message>(callback: &Callback<E>, ctx: Context<E>) -> Result<Context<E>, Context<E>> {
    let fallback = ctx.clone();
    let error: BoxError = match panic::catch_unwind(AssertUnwindSafe(|| callback(ctx))) {
        Ok(Ok(ctx)) => return Ok(ctx),
        Ok(Err(error)) => error,
        Err(payload) => Box::new(HandlerError::from_panic(payload)),
    };
    tracing::debug!(
        pattern = %fallback.predicate().pattern(),
        %error,
        "handler callback failed"
    );
    Err(fallback.with_exception(error))
}

impl<E: Message> Step<E> for Handler<E> {
    fn predicate(&self) -> &Predicate<E> {
        Handler::predicate(self)
    }

    fn runs_on_failure(&self) -> bool {
        !matches!(self, Self::On { .. })
    }
}

impl<E> Clone for Handler<E> {
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

impl<E> fmt::Debug for Handler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Handler");
        debug
            .field("kind", &self.kind())
            .field("predicate", self.predicate());
        if let Self::Path { handlers, .. } = self {
            debug.field("handlers", handlers);
        }
        debug.finish()
    }
}
