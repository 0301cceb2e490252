//! Tower integration.
//!
//! - [`AsyncHttpDispatcher`] is a `tower::Service<HttpRequest>`, so tower
//!   layers and servers built on tower can drive it.
//! - [`service`] turns a tower service into a terminal handler, so existing
//!   services can be mounted inside a handler tree.
//!
//! ```rust,ignore
//! let handlers = [
//!     routes::future::path("/legacy", [trellis_std::tower::service(Predicate::any(), legacy)])?,
//! ];
//! let app = AsyncHttpDispatcher::new(handlers)?;
//! let response = tower::ServiceExt::oneshot(app, request).await?;
//! ```

use crate::{
    dispatcher::AsyncHttpDispatcher,
    http::{AsyncHttpContext, HttpCall, HttpContextExt, HttpRequest, HttpResponse},
    routes::future::AsyncHttpHandler,
};
use futures::future::{BoxFuture, poll_fn};
use std::task::{Context, Poll};
use ::tower::Service;
use trellis_core::{AsyncHandler, AsyncOutcome, BoxError, Predicate, TrellisError};

// ============================================================================
// Dispatcher → Service
// ============================================================================

impl Service<HttpRequest> for AsyncHttpDispatcher {
    type Response = HttpResponse;
    type Error = TrellisError;
    type Future = BoxFuture<'static, Result<HttpResponse, TrellisError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { dispatcher.process(request).await })
    }
}

// ============================================================================
// Service → Handler
// ============================================================================

/// Terminal handler answering matching requests with `service`.
///
/// The service gets a copy of the request; its response is sent and ends the
/// chain. Service errors become the context exception.
pub fn service<S>(predicate: Predicate<HttpCall>, service: S) -> AsyncHttpHandler
where
    S: Service<HttpRequest, Response = HttpResponse> + Clone + Send + Sync + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    AsyncHandler::on(predicate, move |ctx| call_service(service.clone(), ctx))
}

async fn call_service<S>(mut service: S, ctx: AsyncHttpContext) -> AsyncOutcome<HttpCall>
where
    S: Service<HttpRequest, Response = HttpResponse>,
    S::Error: Into<BoxError>,
{
    poll_fn(|cx| service.poll_ready(cx))
        .await
        .map_err(Into::<BoxError>::into)?;
    let response = service
        .call(ctx.request().clone())
        .await
        .map_err(Into::<BoxError>::into)?;
    Ok(ctx.send(response))
}
