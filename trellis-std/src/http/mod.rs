//! # HTTP Model
//!
//! Transport independent request and response types. Server and client
//! adapters convert to and from these; everything between runs on
//! [`HttpCall`] contexts.

mod call;
mod methods;
mod request;
mod response;

pub use call::{AsyncHttpContext, HttpCall, HttpContext, HttpContextExt};
pub use methods::Methods;
pub use request::HttpRequest;
pub use response::HttpResponse;
