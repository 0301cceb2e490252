//! Route DSL for the asynchronous engine.
//!
//! Same builders as the parent module; callbacks return futures.

use super::{predicate, route, scope};
use crate::http::{AsyncHttpContext, HttpCall, Methods};
use std::future::Future;
use trellis_core::{AsyncHandler, AsyncOutcome, PathPattern, PatternError, Predicate};

/// Asynchronous handler over HTTP calls.
pub type AsyncHttpHandler = AsyncHandler<HttpCall>;

/// Route `methods` on `pattern` to `callback`.
pub fn on<F, Fut>(
    methods: Methods,
    pattern: &str,
    callback: F,
) -> Result<AsyncHttpHandler, PatternError>
where
    F: Fn(AsyncHttpContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AsyncOutcome<HttpCall>> + Send + 'static,
{
    Ok(AsyncHandler::on(route(methods, pattern)?, callback))
}

/// Route `methods` on an already built pattern.
pub fn on_pattern<F, Fut>(methods: Methods, pattern: PathPattern, callback: F) -> AsyncHttpHandler
where
    F: Fn(AsyncHttpContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AsyncOutcome<HttpCall>> + Send + 'static,
{
    AsyncHandler::on(predicate(methods, pattern), callback)
}

macro_rules! method_routes {
    ($($name:ident => $flag:ident),* $(,)?) => {
        $(
            #[doc = concat!("Route `", stringify!($flag), "` requests.")]
            pub fn $name<F, Fut>(pattern: &str, callback: F) -> Result<AsyncHttpHandler, PatternError>
            where
                F: Fn(AsyncHttpContext) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = AsyncOutcome<HttpCall>> + Send + 'static,
            {
                on(Methods::$flag, pattern, callback)
            }
        )*
    };
}

method_routes! {
    get => GET,
    post => POST,
    put => PUT,
    delete => DELETE,
    patch => PATCH,
    head => HEAD,
    options => OPTIONS,
}

/// Group handlers below `pattern`.
pub fn path<I>(pattern: &str, handlers: I) -> Result<AsyncHttpHandler, PatternError>
where
    I: IntoIterator<Item = AsyncHttpHandler>,
{
    AsyncHandler::path(scope(pattern)?, handlers)
}

/// Wrap every later handler below `pattern`. The callback awaits `next()`.
pub fn filter<F, Fut>(pattern: &str, callback: F) -> Result<AsyncHttpHandler, PatternError>
where
    F: Fn(AsyncHttpContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AsyncOutcome<HttpCall>> + Send + 'static,
{
    Ok(AsyncHandler::filter(scope(pattern)?, callback))
}

/// Run `callback` once every later handler below `pattern` finished.
pub fn after<F, Fut>(pattern: &str, callback: F) -> Result<AsyncHttpHandler, PatternError>
where
    F: Fn(AsyncHttpContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AsyncOutcome<HttpCall>> + Send + 'static,
{
    Ok(AsyncHandler::after(scope(pattern)?, callback))
}

/// Handle `T` failures raised by later handlers.
pub fn exception<T, F, Fut>(callback: F) -> AsyncHttpHandler
where
    T: std::error::Error + 'static,
    F: Fn(AsyncHttpContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AsyncOutcome<HttpCall>> + Send + 'static,
{
    AsyncHandler::exception::<T, F, Fut>(Predicate::any(), callback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpContextExt, HttpRequest};
    use http::StatusCode;
    use trellis_core::AsyncDispatcher;

    #[derive(Debug, thiserror::Error)]
    #[error("missing")]
    struct Missing;

    #[tokio::test]
    async fn test_async_routes() {
        let dispatcher = AsyncDispatcher::new([
            exception::<Missing, _, _>(|ctx| async move { Ok(ctx.status(StatusCode::NOT_FOUND)) }),
            path(
                "/files",
                [
                    get("/{name}", |ctx| async move {
                        if ctx.path_parameter("name") == Some("known") {
                            Ok(ctx.ok("content"))
                        } else {
                            Err(Missing.into())
                        }
                    })
                    .unwrap(),
                ],
            )
            .unwrap(),
        ])
        .unwrap();

        let ctx = dispatcher
            .process(HttpCall::new(HttpRequest::get("/files/known")))
            .await;
        assert_eq!(ctx.response().and_then(|r| r.body_text()), Some("content"));

        let ctx = dispatcher
            .process(HttpCall::new(HttpRequest::get("/files/other")))
            .await;
        assert!(ctx.exception().is_none());
        assert_eq!(ctx.response().map(|r| r.status()), Some(StatusCode::NOT_FOUND));
    }
}
