//! Portable HTTP request.

use bytes::Bytes;
use http::{
    HeaderMap, HeaderName, HeaderValue, Method,
    header::{self, AsHeaderName},
};

/// A transport independent HTTP request.
///
/// The query string is parsed once, when the request is built, and kept as
/// ordered pairs (a name may repeat).
///
/// ```rust,ignore
/// let request = HttpRequest::new(Method::GET, "/users?page=2")
///     .with_header(header::ACCEPT, HeaderValue::from_static("application/json"));
///
/// assert_eq!(request.path(), "/users");
/// assert_eq!(request.query_parameter("page"), Some("2"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpRequest {
    /// Build a request from a method and a target (`/path?query`).
    pub fn new(method: Method, target: impl AsRef<str>) -> Self {
        let target = target.as_ref();
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, Vec::new()),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// A `GET` request.
    pub fn get(target: impl AsRef<str>) -> Self {
        Self::new(Method::GET, target)
    }

    /// A `POST` request.
    pub fn post(target: impl AsRef<str>) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path, without query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query pairs in order of appearance.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value of the query parameter `name`.
    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value of the query parameter `name`.
    pub fn query_parameters<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.query
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The query string, encoded again. Empty when there are no pairs.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header.
    pub fn header(&self, name: impl AsHeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// The `Content-Type` header as text.
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as UTF-8 text, if it is valid UTF-8.
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Replace the path. The query string is left untouched.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Append a query pair.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Set a header, replacing previous values.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

impl From<http::Request<Bytes>> for HttpRequest {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        let target = parts
            .uri
            .path_and_query()
            .map_or("/", |target| target.as_str());
        let mut converted = Self::new(parts.method, target).with_body(body);
        converted.headers = parts.headers;
        converted
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_is_split() {
        let request = HttpRequest::get("/search?q=rust+lang&tag=a&tag=b");
        assert_eq!(request.path(), "/search");
        assert_eq!(request.query_parameter("q"), Some("rust lang"));
        assert_eq!(request.query_parameters("tag").collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(request.query_parameter("missing"), None);
        assert_eq!(request.query_string(), "q=rust+lang&tag=a&tag=b");
    }

    #[test]
    fn test_builders() {
        let request = HttpRequest::post("/items")
            .with_query("dry", "1")
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_body("hello");

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.content_type(), Some("text/plain"));
        assert_eq!(request.body_text(), Some("hello"));
        assert_eq!(request.query_string(), "dry=1");
    }

    #[test]
    fn test_from_http_request() {
        let request = http::Request::builder()
            .method(Method::PUT)
            .uri("http://example.com/a/b?x=1")
            .header("x-trace", "t1")
            .body(Bytes::from_static(b"{}"))
            .unwrap();

        let request = HttpRequest::from(request);
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.path(), "/a/b");
        assert_eq!(request.query_parameter("x"), Some("1"));
        assert_eq!(request.header("x-trace").unwrap(), "t1");
        assert_eq!(request.body().as_ref(), b"{}");
    }
}
