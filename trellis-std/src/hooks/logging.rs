//! Request logging filters.
//!
//! Each request gets an `http_request` span carrying the method, the path
//! and, when the caller sent one, the `x-request-id` header. Everything the
//! rest of the chain logs is recorded inside that span. Once the chain
//! returns, the span gets the response status and the elapsed time and a
//! completion event is emitted: `info` on success, `warn` when an exception
//! is left on the context.
//!
//! Place the filter first so it wraps every other handler:
//!
//! ```rust,ignore
//! let dispatcher = HttpDispatcher::new([logging::logging(), routes...])?;
//! ```

use crate::{
    http::{AsyncHttpContext, HttpCall, HttpContext, HttpContextExt},
    routes::{HttpHandler, future::AsyncHttpHandler},
};
use std::time::Instant;
use tracing::{Instrument, Span, field};
use trellis_core::{AsyncHandler, Context, Handler, Predicate};

/// Header read into the span's `request_id` field.
pub const REQUEST_ID: &str = "x-request-id";

fn request_span<H>(ctx: &Context<HttpCall, H>) -> Span {
    let request = ctx.request();
    let span = tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = request.path(),
        request_id = field::Empty,
        status = field::Empty,
        elapsed_ms = field::Empty,
    );
    if let Some(id) = request.header(REQUEST_ID).and_then(|v| v.to_str().ok()) {
        span.record("request_id", id);
    }
    span
}

fn completed<H>(span: &Span, ctx: &Context<HttpCall, H>, start: Instant) {
    if let Some(response) = ctx.response() {
        span.record("status", response.status().as_u16());
    }
    span.record("elapsed_ms", start.elapsed().as_millis() as u64);

    span.in_scope(|| match ctx.exception() {
        Some(error) => tracing::warn!(%error, "request failed"),
        None => tracing::info!("request completed"),
    });
}

/// Logging filter for the blocking engine.
pub fn logging() -> HttpHandler {
    Handler::filter(Predicate::any(), |ctx: HttpContext| {
        let span = request_span(&ctx);
        let start = Instant::now();
        let ctx = span.in_scope(|| ctx.next());
        completed(&span, &ctx, start);
        Ok(ctx)
    })
}

/// Logging filter for the asynchronous engine.
pub fn async_logging() -> AsyncHttpHandler {
    AsyncHandler::filter(Predicate::any(), |ctx: AsyncHttpContext| async move {
        let span = request_span(&ctx);
        let start = Instant::now();
        let ctx = ctx.next().instrument(span.clone()).await;
        completed(&span, &ctx, start);
        Ok(ctx)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dispatcher::{AsyncHttpDispatcher, HttpDispatcher},
        http::HttpRequest,
        routes::{self, future},
    };
    use http::{HeaderValue, StatusCode};

    #[derive(Debug, thiserror::Error)]
    #[error("broken")]
    struct Broken;

    #[test]
    fn test_logging_is_transparent() {
        let dispatcher = HttpDispatcher::new([
            logging(),
            routes::get("/hello", |ctx| Ok(ctx.ok("hi"))).unwrap(),
            routes::get("/broken", |_| Err(Broken.into())).unwrap(),
        ])
        .unwrap();

        let request = HttpRequest::get("/hello")
            .with_header(REQUEST_ID.parse().unwrap(), HeaderValue::from_static("r-1"));
        let response = dispatcher.process(request).unwrap();
        assert_eq!(response.body_text(), Some("hi"));

        let response = dispatcher.process(HttpRequest::get("/broken")).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_async_logging_is_transparent() {
        let dispatcher = AsyncHttpDispatcher::new([
            async_logging(),
            future::get("/hello", |ctx| async move { Ok(ctx.ok("hi")) }).unwrap(),
        ])
        .unwrap();

        let response = dispatcher.process(HttpRequest::get("/hello")).await.unwrap();
        assert_eq!(response.body_text(), Some("hi"));

        let response = dispatcher.process(HttpRequest::get("/bye")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
