//! The request/response pair flowing through HTTP handler chains.

use super::{request::HttpRequest, response::HttpResponse};
use bytes::Bytes;
use http::{Method, StatusCode};
use trellis_core::{AsyncContext, Context, Routable};

/// One HTTP exchange: the request and, once produced, the response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpCall {
    request: HttpRequest,
    response: Option<HttpResponse>,
}

impl HttpCall {
    /// A call with no response yet.
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            response: None,
        }
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    pub fn with_request(mut self, request: HttpRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_response(mut self, response: HttpResponse) -> Self {
        self.response = Some(response);
        self
    }

    /// Split into request and response.
    pub fn into_parts(self) -> (HttpRequest, Option<HttpResponse>) {
        (self.request, self.response)
    }
}

impl Routable for HttpCall {
    fn path(&self) -> &str {
        self.request.path()
    }
}

/// Context of the blocking HTTP engine.
pub type HttpContext = Context<HttpCall>;

/// Context of the asynchronous HTTP engine.
pub type AsyncHttpContext = AsyncContext<HttpCall>;

/// HTTP accessors and updates for contexts carrying an [`HttpCall`].
///
/// Implemented for both engine flavours.
pub trait HttpContextExt: Sized {
    fn request(&self) -> &HttpRequest;

    fn response(&self) -> Option<&HttpResponse>;

    /// Replace the request.
    fn with_request(self, request: HttpRequest) -> Self;

    /// Set the response without ending the chain.
    fn with_response(self, response: HttpResponse) -> Self;

    fn method(&self) -> &Method {
        self.request().method()
    }

    /// First value of a query parameter.
    fn query_parameter(&self, name: &str) -> Option<&str> {
        self.request().query_parameter(name)
    }

    /// Transform the request.
    fn map_request(self, f: impl FnOnce(HttpRequest) -> HttpRequest) -> Self {
        let request = f(self.request().clone());
        self.with_request(request)
    }

    /// Transform the response, starting from an empty `200` if none is set.
    fn map_response(self, f: impl FnOnce(HttpResponse) -> HttpResponse) -> Self {
        let response = f(self.response().cloned().unwrap_or_default());
        self.with_response(response)
    }

    /// Set the response and mark the context handled, so no later sibling
    /// handler runs.
    fn send(self, response: HttpResponse) -> Self;

    /// Send `200 OK` with `body`.
    fn ok(self, body: impl Into<Bytes>) -> Self {
        self.send(HttpResponse::ok(body))
    }

    /// Send an empty response with `status`.
    fn status(self, status: StatusCode) -> Self {
        self.send(HttpResponse::new(status))
    }
}

impl<H> HttpContextExt for Context<HttpCall, H> {
    fn request(&self) -> &HttpRequest {
        self.event().request()
    }

    fn response(&self) -> Option<&HttpResponse> {
        self.event().response()
    }

    fn with_request(self, request: HttpRequest) -> Self {
        self.map_event(|call| call.with_request(request))
    }

    fn with_response(self, response: HttpResponse) -> Self {
        self.map_event(|call| call.with_response(response))
    }

    fn send(self, response: HttpResponse) -> Self {
        self.with_response(response).with_handled(true)
    }
}
