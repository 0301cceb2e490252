#![allow(dead_code)]

use trellis::{Context, Handler, Message, Outcome, Predicate};

// ============================================================================
// Test Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
#[error("boom")]
pub struct Boom;

#[derive(Debug, thiserror::Error)]
#[error("other failure")]
pub struct Other;

// ============================================================================
// Predicates and Callbacks
// ============================================================================

/// Predicate matching `pattern` as a prefix.
pub fn prefix(pattern: &str) -> Predicate<String> {
    Predicate::path(pattern, true).unwrap()
}

/// Predicate matching whole paths against `pattern`.
pub fn exact(pattern: &str) -> Predicate<String> {
    Predicate::path(pattern, false).unwrap()
}

/// Ends the current nesting level.
pub fn handled<E: Message>(ctx: Context<E>) -> Outcome<E> {
    Ok(ctx.with_handled(true))
}

/// Fails with [`Boom`].
pub fn fail<E: Message>(_ctx: Context<E>) -> Outcome<E> {
    Err(Boom.into())
}

/// Copies the `id` path parameter into the `echo` attribute and ends the
/// nesting level.
pub fn echo_id(ctx: Context<String>) -> Outcome<String> {
    match ctx.path_parameter("id").map(str::to_string) {
        Some(id) => Ok(ctx.with_attribute("echo", id).with_handled(true)),
        None => Ok(ctx),
    }
}

/// Leaf handler answering `mark` on `pattern`.
pub fn answer(pattern: &str, mark: &'static str) -> Handler<String> {
    Handler::on(exact(pattern), move |ctx| {
        Ok(ctx.with_attribute("answer", mark).with_handled(true))
    })
}

pub fn answer_of(ctx: &Context<String>) -> Option<&'static str> {
    ctx.attribute::<&'static str>("answer").copied()
}
