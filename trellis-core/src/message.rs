//! Message traits for event types.

/// A marker trait for the payloads carried by a [`Context`].
///
/// Messages must be cheap enough to clone once per handler invocation
/// (contexts are copy-on-write) and safe to move across threads.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone)]
/// struct MyEvent { id: u64 }
///
/// // `MyEvent` is a `Message` through the blanket implementation.
/// ```
///
/// [`Context`]: crate::Context
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Clone + Send + Sync + 'static`",
    note = "Events flowing through a handler chain are cloned and moved between tasks."
)]
pub trait Message: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Message for T {}

/// A message that can be routed by path.
///
/// Every handler predicate tests its [`PathPattern`] against the value
/// returned here.
///
/// [`PathPattern`]: crate::PathPattern
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be routed by path",
    label = "missing `Routable` implementation",
    note = "Implement `Routable::path` to expose the request path of `{Self}`."
)]
pub trait Routable: Message {
    /// The request path matched against handler patterns.
    fn path(&self) -> &str;
}

impl Routable for String {
    fn path(&self) -> &str {
        self
    }
}

impl Routable for &'static str {
    fn path(&self) -> &str {
        self
    }
}
