//! # Route DSL
//!
//! Builders for HTTP handler trees. Route patterns (`get`, `post`, ...) match
//! whole paths; `path`, `filter` and `after` match prefixes so they cover
//! everything below them.
//!
//! ```rust,ignore
//! use trellis_std::routes::{after, get, path};
//!
//! let handlers = [
//!     after("", |ctx| Ok(ctx.map_response(|r| r.with_header(SERVER, NAME))))?,
//!     path("/users", [
//!         get("/{id}", |ctx| {
//!             let id = ctx.path_parameter("id").unwrap_or_default().to_string();
//!             Ok(ctx.ok(id))
//!         })?,
//!     ])?,
//! ];
//! ```
//!
//! The asynchronous flavour lives in [`future`].

pub mod future;

use crate::http::{HttpCall, HttpContext, Methods};
use trellis_core::{Handler, Outcome, PathPattern, PatternError, Predicate};

/// Blocking handler over HTTP calls.
pub type HttpHandler = Handler<HttpCall>;

/// Predicate accepting `methods` on paths matching `pattern`.
pub fn predicate(methods: Methods, pattern: PathPattern) -> Predicate<HttpCall> {
    let predicate = Predicate::new(pattern);
    if methods.is_all() {
        predicate
    } else {
        predicate.with_condition(move |call: &HttpCall| methods.accepts(call.request().method()))
    }
}

fn route(methods: Methods, pattern: &str) -> Result<Predicate<HttpCall>, PatternError> {
    Ok(predicate(methods, PathPattern::parse(pattern, false)?))
}

fn scope(pattern: &str) -> Result<Predicate<HttpCall>, PatternError> {
    Ok(predicate(Methods::all(), PathPattern::parse(pattern, true)?))
}

/// Route `methods` on `pattern` to `callback`.
pub fn on<F>(methods: Methods, pattern: &str, callback: F) -> Result<HttpHandler, PatternError>
where
    F: Fn(HttpContext) -> Outcome<HttpCall> + Send + Sync + 'static,
{
    Ok(Handler::on(route(methods, pattern)?, callback))
}

/// Route `methods` on an already built pattern, regexes included.
pub fn on_pattern<F>(methods: Methods, pattern: PathPattern, callback: F) -> HttpHandler
where
    F: Fn(HttpContext) -> Outcome<HttpCall> + Send + Sync + 'static,
{
    Handler::on(predicate(methods, pattern), callback)
}

macro_rules! method_routes {
    ($($(#[$doc:meta])* $name:ident => $flag:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name<F>(pattern: &str, callback: F) -> Result<HttpHandler, PatternError>
            where
                F: Fn(HttpContext) -> Outcome<HttpCall> + Send + Sync + 'static,
            {
                on(Methods::$flag, pattern, callback)
            }
        )*
    };
}

method_routes! {
    /// Route `GET` requests.
    get => GET,
    /// Route `POST` requests.
    post => POST,
    /// Route `PUT` requests.
    put => PUT,
    /// Route `DELETE` requests.
    delete => DELETE,
    /// Route `PATCH` requests.
    patch => PATCH,
    /// Route `HEAD` requests.
    head => HEAD,
    /// Route `OPTIONS` requests.
    options => OPTIONS,
}

/// Group handlers below `pattern`.
pub fn path<I>(pattern: &str, handlers: I) -> Result<HttpHandler, PatternError>
where
    I: IntoIterator<Item = HttpHandler>,
{
    Handler::path(scope(pattern)?, handlers)
}

/// Wrap every later handler below `pattern`. The callback calls `next()`.
pub fn filter<F>(pattern: &str, callback: F) -> Result<HttpHandler, PatternError>
where
    F: Fn(HttpContext) -> Outcome<HttpCall> + Send + Sync + 'static,
{
    Ok(Handler::filter(scope(pattern)?, callback))
}

/// Run `callback` once every later handler below `pattern` finished.
pub fn after<F>(pattern: &str, callback: F) -> Result<HttpHandler, PatternError>
where
    F: Fn(HttpContext) -> Outcome<HttpCall> + Send + Sync + 'static,
{
    Ok(Handler::after(scope(pattern)?, callback))
}

/// Handle `T` failures raised by later handlers.
pub fn exception<T, F>(callback: F) -> HttpHandler
where
    T: std::error::Error + 'static,
    F: Fn(HttpContext) -> Outcome<HttpCall> + Send + Sync + 'static,
{
    Handler::exception::<T, F>(Predicate::any(), callback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpContextExt, HttpRequest};
    use http::{Method, StatusCode};
    use trellis_core::Dispatcher;

    fn dispatch(handlers: Vec<HttpHandler>, request: HttpRequest) -> HttpContext {
        Dispatcher::new(handlers)
            .unwrap()
            .process(HttpCall::new(request))
    }

    #[test]
    fn test_method_filtering() {
        let handlers = vec![
            get("/items", |ctx| Ok(ctx.ok("list"))).unwrap(),
            post("/items", |ctx| Ok(ctx.status(StatusCode::CREATED))).unwrap(),
        ];

        let ctx = dispatch(handlers.clone(), HttpRequest::get("/items"));
        assert_eq!(ctx.response().and_then(|r| r.body_text()), Some("list"));

        let ctx = dispatch(handlers.clone(), HttpRequest::post("/items"));
        assert_eq!(ctx.response().map(|r| r.status()), Some(StatusCode::CREATED));

        let ctx = dispatch(handlers, HttpRequest::new(Method::DELETE, "/items"));
        assert!(ctx.response().is_none());
    }

    #[test]
    fn test_routes_match_whole_paths() {
        let handlers = vec![get("/items", |ctx| Ok(ctx.ok("list"))).unwrap()];
        let ctx = dispatch(handlers, HttpRequest::get("/items/1"));
        assert!(ctx.response().is_none());
    }

    #[test]
    fn test_nested_routes() {
        let handlers = vec![
            path(
                "/users",
                [
                    get("/{id}", |ctx| {
                        let id = ctx.path_parameter("id").unwrap_or_default().to_string();
                        Ok(ctx.ok(id))
                    })
                    .unwrap(),
                ],
            )
            .unwrap(),
        ];

        let ctx = dispatch(handlers, HttpRequest::get("/users/42"));
        assert_eq!(ctx.response().and_then(|r| r.body_text()), Some("42"));
    }

    #[test]
    fn test_regex_route() {
        let pattern = PathPattern::regex(r"/v(?<version>\d+)/status$").unwrap();
        let handlers = vec![on_pattern(Methods::GET, pattern, |ctx| {
            let version = ctx.path_parameter("version").unwrap_or_default().to_string();
            Ok(ctx.ok(version))
        })];

        let ctx = dispatch(handlers, HttpRequest::get("/v3/status"));
        assert_eq!(ctx.response().and_then(|r| r.body_text()), Some("3"));
    }
}
