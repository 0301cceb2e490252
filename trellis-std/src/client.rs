//! # HTTP Client
//!
//! Outbound requests go through the same handler machinery as inbound ones.
//! An [`HttpClient`] applies its [`ClientSettings`] to every request, runs
//! the optional user handler and finally hands the request to a
//! [`ClientPort`], the transport adapter.
//!
//! ```rust,ignore
//! let client = HttpClient::new(port, ClientSettings::new().base_path("/api"));
//! client.start()?;
//! let response = client.get("/users/1")?;
//! client.shut_down()?;
//! ```
//!
//! A user handler can rewrite requests, inspect responses or answer on its
//! own. Marking the context handled skips the port entirely, which is how
//! tests stub remote services.
//!
//! The client keeps a cookie jar: `Set-Cookie` headers of every response are
//! stored by name and sent back in a `Cookie` header on later requests.

use crate::{
    dispatcher::{DispatcherSettings, HttpDispatcher},
    http::{HttpContext, HttpContextExt, HttpRequest, HttpResponse},
    routes::HttpHandler,
};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, header};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;
use trellis_core::{Attributes, BoxError, Handler, PatternError, Predicate, TrellisError};

/// Transport adapter used by [`HttpClient`].
pub trait ClientPort: Send + Sync + 'static {
    /// Perform one request.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError>;

    fn start(&self) -> Result<(), BoxError>;

    fn shut_down(&self) -> Result<(), BoxError>;

    fn started(&self) -> bool;
}

/// Client failures.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP client must be started before use")]
    NotStarted,
    #[error("HTTP client is already started")]
    AlreadyStarted,
    #[error("client port failed: {0}")]
    Port(#[source] BoxError),
    #[error(transparent)]
    Dispatch(#[from] TrellisError),
}

/// Defaults applied to every outgoing request.
///
/// Values already present on a request win over the defaults.
#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
    base_path: String,
    headers: HeaderMap,
    content_type: Option<HeaderValue>,
    accept: Option<HeaderValue>,
    authorization: Option<HeaderValue>,
}

impl ClientSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepended to every request path.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn content_type(mut self, value: HeaderValue) -> Self {
        self.content_type = Some(value);
        self
    }

    pub fn accept(mut self, value: HeaderValue) -> Self {
        self.accept = Some(value);
        self
    }

    pub fn authorization(mut self, value: HeaderValue) -> Self {
        self.authorization = Some(value);
        self
    }

    /// Complete `request` with the configured defaults.
    pub fn apply(&self, request: HttpRequest) -> HttpRequest {
        let path = format!("{}{}", self.base_path, request.path());
        let mut request = request.with_path(path);

        let defaults = [
            (header::CONTENT_TYPE, &self.content_type),
            (header::ACCEPT, &self.accept),
            (header::AUTHORIZATION, &self.authorization),
        ];
        for (name, value) in defaults {
            if let Some(value) = value {
                request.headers_mut().entry(name).or_insert_with(|| value.clone());
            }
        }

        for name in self.headers.keys() {
            if request.headers().contains_key(name) {
                continue;
            }
            for value in self.headers.get_all(name) {
                request.headers_mut().append(name.clone(), value.clone());
            }
        }
        request
    }
}

/// A cookie held by the client jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse the `name=value` pair of a `Set-Cookie` header.
    ///
    /// Returns the cookie and whether the header expires it right away
    /// (`Max-Age=0`).
    fn parse_set_cookie(header: &str) -> Option<(Self, bool)> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let expired = parts.any(|attribute| {
            attribute
                .split_once('=')
                .is_some_and(|(key, value)| {
                    key.trim().eq_ignore_ascii_case("max-age") && value.trim() == "0"
                })
        });
        Some((Self::new(name, value.trim().trim_matches('"')), expired))
    }
}

/// Client running requests through a handler chain ending at a port.
pub struct HttpClient<P> {
    port: Arc<P>,
    settings: ClientSettings,
    dispatcher: Option<HttpDispatcher>,
    cookies: Mutex<Vec<Cookie>>,
}

impl<P: ClientPort> HttpClient<P> {
    /// A client sending straight to `port`.
    pub fn new(port: P, settings: ClientSettings) -> Self {
        Self {
            port: Arc::new(port),
            settings,
            dispatcher: None,
            cookies: Mutex::default(),
        }
    }

    /// A client running `handler` before the port.
    ///
    /// The port is reached through a terminal step placed after `handler`;
    /// a filter calling `next()` wraps the actual send.
    pub fn with_handler(
        port: P,
        settings: ClientSettings,
        handler: HttpHandler,
    ) -> Result<Self, PatternError> {
        let port = Arc::new(port);
        let terminal = {
            let port = Arc::clone(&port);
            Handler::on(Predicate::any(), move |ctx: HttpContext| {
                let response = port.send(ctx.request())?;
                Ok(ctx.send(response))
            })
        };
        let dispatcher =
            HttpDispatcher::with_settings([handler, terminal], DispatcherSettings::client())?;

        Ok(Self {
            port,
            settings,
            dispatcher: Some(dispatcher),
            cookies: Mutex::default(),
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn started(&self) -> bool {
        self.port.started()
    }

    /// Cookies currently held, in the order they were first received.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.jar().clone()
    }

    /// Cookies currently held, by name.
    pub fn cookies_map(&self) -> HashMap<String, Cookie> {
        self.jar()
            .iter()
            .map(|cookie| (cookie.name.clone(), cookie.clone()))
            .collect()
    }

    /// Replace the whole jar.
    pub fn set_cookies(&self, cookies: impl IntoIterator<Item = Cookie>) {
        *self.jar() = cookies.into_iter().collect();
    }

    fn jar(&self) -> MutexGuard<'_, Vec<Cookie>> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach_cookies(&self, mut request: HttpRequest) -> HttpRequest {
        let jar = self.jar();
        if jar.is_empty() || request.headers().contains_key(header::COOKIE) {
            return request;
        }
        let line = jar
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        if let Ok(value) = HeaderValue::from_str(&line) {
            request.headers_mut().insert(header::COOKIE, value);
        }
        request
    }

    fn store_cookies(&self, response: &HttpResponse) {
        let mut jar = self.jar();
        for value in response.headers().get_all(header::SET_COOKIE) {
            let Some((cookie, expired)) = value
                .to_str()
                .ok()
                .and_then(Cookie::parse_set_cookie)
            else {
                tracing::debug!(?value, "ignoring malformed Set-Cookie header");
                continue;
            };
            jar.retain(|held| held.name != cookie.name);
            if !expired {
                jar.push(cookie);
            }
        }
    }

    pub fn start(&self) -> Result<(), ClientError> {
        if self.started() {
            return Err(ClientError::AlreadyStarted);
        }
        self.port.start().map_err(ClientError::Port)?;
        tracing::debug!(base_path = %self.settings.base_path, "HTTP client started");
        Ok(())
    }

    pub fn shut_down(&self) -> Result<(), ClientError> {
        if !self.started() {
            return Err(ClientError::NotStarted);
        }
        self.port.shut_down().map_err(ClientError::Port)?;
        tracing::debug!("HTTP client stopped");
        Ok(())
    }

    /// Send a request.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        self.send_with(request, Attributes::new())
    }

    /// Send a request, seeding the handler context with `attributes`.
    pub fn send_with(
        &self,
        request: HttpRequest,
        attributes: Attributes,
    ) -> Result<HttpResponse, ClientError> {
        if !self.started() {
            return Err(ClientError::NotStarted);
        }
        let request = self.attach_cookies(self.settings.apply(request));
        let response = match &self.dispatcher {
            Some(dispatcher) => dispatcher.process_with(request, attributes)?,
            None => self.port.send(&request).map_err(ClientError::Port)?,
        };
        self.store_cookies(&response);
        Ok(response)
    }

    pub fn get(&self, path: &str) -> Result<HttpResponse, ClientError> {
        self.send(HttpRequest::new(Method::GET, path))
    }

    pub fn head(&self, path: &str) -> Result<HttpResponse, ClientError> {
        self.send(HttpRequest::new(Method::HEAD, path))
    }

    pub fn options(&self, path: &str) -> Result<HttpResponse, ClientError> {
        self.send(HttpRequest::new(Method::OPTIONS, path))
    }

    pub fn delete(&self, path: &str) -> Result<HttpResponse, ClientError> {
        self.send(HttpRequest::new(Method::DELETE, path))
    }

    pub fn trace(&self, path: &str) -> Result<HttpResponse, ClientError> {
        self.send(HttpRequest::new(Method::TRACE, path))
    }

    pub fn post(&self, path: &str, body: impl Into<Bytes>) -> Result<HttpResponse, ClientError> {
        self.send(HttpRequest::new(Method::POST, path).with_body(body))
    }

    pub fn put(&self, path: &str, body: impl Into<Bytes>) -> Result<HttpResponse, ClientError> {
        self.send(HttpRequest::new(Method::PUT, path).with_body(body))
    }

    pub fn patch(&self, path: &str, body: impl Into<Bytes>) -> Result<HttpResponse, ClientError> {
        self.send(HttpRequest::new(Method::PATCH, path).with_body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{routes, testing::RecordingPort};
    use http::StatusCode;

    fn started(client: HttpClient<RecordingPort>) -> HttpClient<RecordingPort> {
        client.start().unwrap();
        client
    }

    #[test]
    fn test_lifecycle() {
        let client = HttpClient::new(RecordingPort::new(), ClientSettings::new());
        assert!(matches!(client.get("/"), Err(ClientError::NotStarted)));
        assert!(matches!(client.shut_down(), Err(ClientError::NotStarted)));

        client.start().unwrap();
        assert!(client.started());
        assert!(matches!(client.start(), Err(ClientError::AlreadyStarted)));

        client.shut_down().unwrap();
        assert!(!client.started());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ClientSettings::new()
            .base_path("/api")
            .content_type(HeaderValue::from_static("application/json"))
            .header(
                HeaderName::from_static("x-tenant"),
                HeaderValue::from_static("acme"),
            );
        let client = started(HttpClient::new(RecordingPort::new(), settings));

        client
            .send(
                HttpRequest::post("/users")
                    .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
            )
            .unwrap();

        let sent = client.port().requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].path(), "/api/users");
        assert_eq!(sent[0].content_type(), Some("text/csv"));
        assert_eq!(sent[0].header("x-tenant").unwrap(), "acme");
    }

    #[test]
    fn test_handler_wraps_port() {
        let handler = routes::filter("", |ctx| {
            let ctx = ctx
                .map_request(|r| r.with_header(header::ACCEPT, HeaderValue::from_static("*/*")))
                .next();
            Ok(ctx.map_response(|r| r.with_status(StatusCode::ACCEPTED)))
        })
        .unwrap();
        let port = RecordingPort::new().respond(HttpResponse::ok("remote"));
        let client = started(HttpClient::with_handler(port, ClientSettings::new(), handler).unwrap());

        let response = client.get("/status").unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.body_text(), Some("remote"));
        assert_eq!(client.port().requests()[0].header(header::ACCEPT).unwrap(), "*/*");
    }

    #[test]
    fn test_handler_can_stub_port() {
        let handler = routes::get("/stub", |ctx| Ok(ctx.ok("local"))).unwrap();
        let client = started(
            HttpClient::with_handler(RecordingPort::new(), ClientSettings::new(), handler).unwrap(),
        );

        assert_eq!(client.get("/stub").unwrap().body_text(), Some("local"));
        assert!(client.port().requests().is_empty());
    }

    #[test]
    fn test_cookie_jar_round_trip() {
        let mut response = HttpResponse::ok("");
        for line in ["session=abc; Path=/; HttpOnly", "theme=dark", "=broken"] {
            response
                .headers_mut()
                .append(header::SET_COOKIE, HeaderValue::from_static(line));
        }
        let client = started(HttpClient::new(
            RecordingPort::new().respond(response),
            ClientSettings::new(),
        ));

        client.get("/login").unwrap();
        assert_eq!(
            client.cookies(),
            [Cookie::new("session", "abc"), Cookie::new("theme", "dark")]
        );
        assert_eq!(client.cookies_map()["theme"].value, "dark");

        client.trace("/echo").unwrap();
        let sent = client.port().requests();
        assert!(sent[0].header(header::COOKIE).is_none());
        assert_eq!(sent[1].method(), &Method::TRACE);
        assert_eq!(sent[1].header(header::COOKIE).unwrap(), "session=abc; theme=dark");
    }

    #[test]
    fn test_expired_cookie_leaves_jar() {
        let response = HttpResponse::ok("").with_header(
            header::SET_COOKIE,
            HeaderValue::from_static("session=; Max-Age=0"),
        );
        let client = started(HttpClient::new(
            RecordingPort::new().respond(response),
            ClientSettings::new(),
        ));
        client.set_cookies([Cookie::new("session", "abc"), Cookie::new("lang", "en")]);

        client
            .send(HttpRequest::get("/logout").with_header(
                header::COOKIE,
                HeaderValue::from_static("explicit=1"),
            ))
            .unwrap();
        assert_eq!(client.port().requests()[0].header(header::COOKIE).unwrap(), "explicit=1");
        assert_eq!(client.cookies(), [Cookie::new("lang", "en")]);
    }

    #[test]
    fn test_port_failure() {
        let client = started(HttpClient::new(
            RecordingPort::new().fail_with("connection refused"),
            ClientSettings::new(),
        ));
        let error = client.get("/").unwrap_err();
        assert!(matches!(error, ClientError::Port(_)));
        assert_eq!(error.to_string(), "client port failed: connection refused");
    }
}
