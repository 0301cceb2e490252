//! # HTTP Dispatchers
//!
//! The single entry point adapters call: build a call from the request, run
//! it through the handler tree and turn the final context into a response.
//!
//! What happens to a failure nobody handled depends on the [`Mode`]:
//!
//! | Outcome               | `Server`                    | `Client`                       |
//! |-----------------------|-----------------------------|--------------------------------|
//! | response set          | the response                | the response                   |
//! | exception left        | error response (500)        | [`TrellisError::Unresolved`]   |
//! | nothing produced      | `404 Not Found`             | [`TrellisError::NoResponse`]   |

use crate::{
    http::{HttpCall, HttpRequest, HttpResponse},
    routes::{HttpHandler, future::AsyncHttpHandler},
};
use http::StatusCode;
use trellis_core::{AsyncDispatcher, Attributes, Context, Dispatcher, PatternError, TrellisError};

/// How unresolved outcomes are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Always answer with a response.
    #[default]
    Server,
    /// Return failures to the caller.
    Client,
}

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherSettings {
    mode: Mode,
    error_status: StatusCode,
    expose_errors: bool,
}

impl DispatcherSettings {
    /// Server settings: failures become `500` responses.
    pub fn server() -> Self {
        Self {
            mode: Mode::Server,
            error_status: StatusCode::INTERNAL_SERVER_ERROR,
            expose_errors: false,
        }
    }

    /// Client settings: failures are returned as errors.
    pub fn client() -> Self {
        Self {
            mode: Mode::Client,
            ..Self::server()
        }
    }

    /// Status used for unresolved exceptions in server mode.
    pub fn error_status(mut self, status: StatusCode) -> Self {
        self.error_status = status;
        self
    }

    /// Put the exception message in error response bodies instead of the
    /// status reason.
    pub fn expose_errors(mut self, expose: bool) -> Self {
        self.expose_errors = expose;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn resolve<H>(&self, ctx: Context<HttpCall, H>) -> Result<HttpResponse, TrellisError> {
        let exception = ctx.exception().cloned();
        let (request, response) = ctx.into_event().into_parts();

        match (self.mode, exception, response) {
            (Mode::Client, Some(exception), _) => Err(TrellisError::Unresolved(exception)),
            (_, None, Some(response)) => Ok(response),
            (Mode::Client, None, None) => Err(TrellisError::NoResponse),
            (Mode::Server, Some(exception), _) => {
                tracing::error!(
                    method = %request.method(),
                    path = request.path(),
                    error = %exception,
                    "unhandled exception"
                );
                let message = if self.expose_errors {
                    exception.to_string()
                } else {
                    self.error_status
                        .canonical_reason()
                        .unwrap_or_default()
                        .to_string()
                };
                Ok(HttpResponse::internal_error(message).with_status(self.error_status))
            }
            (Mode::Server, None, None) => {
                tracing::debug!(
                    method = %request.method(),
                    path = request.path(),
                    "no handler produced a response"
                );
                Ok(HttpResponse::not_found())
            }
        }
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self::server()
    }
}

/// Blocking HTTP entry point.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    dispatcher: Dispatcher<HttpCall>,
    settings: DispatcherSettings,
}

impl HttpDispatcher {
    /// A server mode dispatcher.
    pub fn new<I>(handlers: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = HttpHandler>,
    {
        Self::with_settings(handlers, DispatcherSettings::default())
    }

    pub fn with_settings<I>(handlers: I, settings: DispatcherSettings) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = HttpHandler>,
    {
        Ok(Self {
            dispatcher: Dispatcher::new(handlers)?,
            settings,
        })
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Process a request.
    pub fn process(&self, request: HttpRequest) -> Result<HttpResponse, TrellisError> {
        self.process_with(request, Attributes::new())
    }

    /// Process a request from a context seeded with `attributes`.
    pub fn process_with(
        &self,
        request: HttpRequest,
        attributes: Attributes,
    ) -> Result<HttpResponse, TrellisError> {
        let ctx = self
            .dispatcher
            .process_with(HttpCall::new(request), attributes);
        self.settings.resolve(ctx)
    }
}

/// Asynchronous HTTP entry point.
#[derive(Debug, Clone)]
pub struct AsyncHttpDispatcher {
    dispatcher: AsyncDispatcher<HttpCall>,
    settings: DispatcherSettings,
}

impl AsyncHttpDispatcher {
    /// A server mode dispatcher.
    pub fn new<I>(handlers: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = AsyncHttpHandler>,
    {
        Self::with_settings(handlers, DispatcherSettings::default())
    }

    pub fn with_settings<I>(handlers: I, settings: DispatcherSettings) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = AsyncHttpHandler>,
    {
        Ok(Self {
            dispatcher: AsyncDispatcher::new(handlers)?,
            settings,
        })
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Process a request.
    pub async fn process(&self, request: HttpRequest) -> Result<HttpResponse, TrellisError> {
        self.process_with(request, Attributes::new()).await
    }

    /// Process a request from a context seeded with `attributes`.
    pub async fn process_with(
        &self,
        request: HttpRequest,
        attributes: Attributes,
    ) -> Result<HttpResponse, TrellisError> {
        let ctx = self
            .dispatcher
            .process_with(HttpCall::new(request), attributes)
            .await;
        self.settings.resolve(ctx)
    }
}
