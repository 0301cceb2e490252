//! # trellis - Composable Handler Chains
//!
//! `trellis` processes requests by running them through an ordered tree of
//! handlers. Each handler is selected by a predicate (a path pattern plus an
//! optional condition) and sees an immutable [`Context`] that it transforms
//! and passes on.
//!
//! - **On** handlers do the work and continue with the next handler.
//! - **Filters** wrap the rest of the chain and decide when to call `next()`.
//! - **After** handlers run once the rest of the chain finished.
//! - **Exception** handlers recover from failures raised further down.
//! - **Path** handlers group children below a common prefix.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::prelude::*;
//!
//! let server = HttpDispatcher::new([
//!     hooks::logging::logging(),
//!     routes::path("/users", [
//!         routes::get("/{id}", |ctx| {
//!             let id = ctx.path_parameter("id").unwrap_or_default().to_string();
//!             Ok(ctx.ok(id))
//!         })?,
//!     ])?,
//! ])?;
//!
//! let response = server.process(HttpRequest::get("/users/42"))?;
//! assert_eq!(response.body_text(), Some("42"));
//! ```
//!
//! ## Engines
//!
//! The blocking engine ([`Handler`], [`Dispatcher`]) calls callbacks in
//! place. The asynchronous engine ([`AsyncHandler`], [`AsyncDispatcher`])
//! drives boxed futures and stops as soon as its future is dropped.
//!
//! ## Features
//!
//! - `timeout`: tokio based timeout filter in [`hooks`]
//! - `tower`: `tower::Service` adapters

#![deny(clippy::wildcard_imports)]

pub use trellis_core::{
    // Engine
    AsyncContext,
    AsyncDispatcher,
    AsyncHandler,
    AsyncOutcome,
    Attributes,
    Context,
    Dispatcher,
    Handler,
    Outcome,
    // Errors
    BoxError,
    Exception,
    HandlerError,
    PathError,
    PatternError,
    TrellisError,
    // Events
    Message,
    Routable,
    // Patterns
    LiteralPattern,
    Parameters,
    PathPattern,
    Predicate,
    RegexPattern,
    TemplatePattern,
};

pub use trellis_std::{
    client::{ClientError, ClientPort, ClientSettings, Cookie, HttpClient},
    dispatcher::{AsyncHttpDispatcher, DispatcherSettings, HttpDispatcher, Mode},
    routes::{HttpHandler, future::AsyncHttpHandler},
};

/// HTTP model, plus the `http` crate types it is built from.
pub mod http {
    pub use ::bytes::Bytes;
    pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
    pub use trellis_std::http::{
        AsyncHttpContext, HttpCall, HttpContext, HttpContextExt, HttpRequest, HttpResponse,
        Methods,
    };
}

/// Route DSL.
pub mod routes {
    #![allow(clippy::wildcard_imports)]
    pub use trellis_std::routes::*;
}

/// Standard filters.
pub mod hooks {
    #![allow(clippy::wildcard_imports)]
    pub use trellis_std::hooks::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use trellis_std::testing::*;
}

/// Tower interop.
#[cfg(feature = "tower")]
pub mod tower {
    #![allow(clippy::wildcard_imports)]
    pub use trellis_std::tower::*;
}

/// Prelude module - common imports for Trellis.
///
/// ```rust,ignore
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AsyncContext, AsyncDispatcher, AsyncHandler, AsyncHttpDispatcher, AsyncHttpHandler,
        Attributes, BoxError, Context, Dispatcher, Handler, HttpDispatcher, HttpHandler,
        PathPattern, Predicate, TrellisError, hooks,
        http::{
            AsyncHttpContext, HttpCall, HttpContext, HttpContextExt, HttpRequest, HttpResponse,
            Methods, StatusCode,
        },
        routes,
    };
}
