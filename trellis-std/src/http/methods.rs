//! Method sets used by HTTP predicates.

use bitflags::bitflags;
use http::Method;

bitflags! {
    /// A set of HTTP methods.
    ///
    /// Extension methods have no flag; only [`Methods::all`] accepts them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Methods: u16 {
        const GET = 1 << 0;
        const HEAD = 1 << 1;
        const POST = 1 << 2;
        const PUT = 1 << 3;
        const DELETE = 1 << 4;
        const PATCH = 1 << 5;
        const OPTIONS = 1 << 6;
        const TRACE = 1 << 7;
        const CONNECT = 1 << 8;
    }
}

impl Methods {
    /// The flag for `method`, empty for extension methods.
    pub fn from_method(method: &Method) -> Self {
        match *method {
            Method::GET => Self::GET,
            Method::HEAD => Self::HEAD,
            Method::POST => Self::POST,
            Method::PUT => Self::PUT,
            Method::DELETE => Self::DELETE,
            Method::PATCH => Self::PATCH,
            Method::OPTIONS => Self::OPTIONS,
            Method::TRACE => Self::TRACE,
            Method::CONNECT => Self::CONNECT,
            _ => Self::empty(),
        }
    }

    /// Whether `method` belongs to the set.
    pub fn accepts(&self, method: &Method) -> bool {
        let flag = Self::from_method(method);
        self.is_all() || (!flag.is_empty() && self.contains(flag))
    }
}

impl From<Method> for Methods {
    fn from(method: Method) -> Self {
        Self::from_method(&method)
    }
}
