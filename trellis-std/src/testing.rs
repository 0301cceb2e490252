//! Testing utilities for Trellis.
//!
//! # Features
//!
//! - [`Recorder`]: callbacks that log a mark each time they run, to assert
//!   execution order
//! - [`Counter`]: callbacks that count invocations
//! - [`RecordingPort`]: a [`ClientPort`] that records requests and answers
//!   with a canned response

use crate::{
    client::ClientPort,
    http::{HttpRequest, HttpResponse},
};
use futures::future::{self, Ready};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use trellis_core::{AsyncContext, AsyncOutcome, BoxError, Context, Message, Outcome, Routable};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Recorder
// ============================================================================

/// Shared log of marks written by handler callbacks.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = Recorder::new();
/// let dispatcher = Dispatcher::new([
///     Handler::after(Predicate::any(), recorder.callback("after")),
///     Handler::on(Predicate::any(), recorder.callback("on")),
/// ])?;
///
/// dispatcher.process("/".to_string());
/// assert_eq!(recorder.marks(), ["on", "after"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    marks: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, mark: impl Into<String>) {
        lock(&self.marks).push(mark.into());
    }

    /// Marks recorded so far, oldest first.
    pub fn marks(&self) -> Vec<String> {
        lock(&self.marks).clone()
    }

    pub fn clear(&self) {
        lock(&self.marks).clear();
    }

    /// Callback recording `mark` and passing the context through.
    pub fn callback<E: Message>(
        &self,
        mark: &str,
    ) -> impl Fn(Context<E>) -> Outcome<E> + Send + Sync + 'static {
        let recorder = self.clone();
        let mark = mark.to_string();
        move |ctx| {
            recorder.record(mark.clone());
            Ok(ctx)
        }
    }

    /// Filter callback recording `{mark}:before`, running the rest of the
    /// chain and recording `{mark}:after`.
    pub fn around<E: Routable>(
        &self,
        mark: &str,
    ) -> impl Fn(Context<E>) -> Outcome<E> + Send + Sync + 'static {
        let recorder = self.clone();
        let mark = mark.to_string();
        move |ctx| {
            recorder.record(format!("{mark}:before"));
            let ctx = ctx.next();
            recorder.record(format!("{mark}:after"));
            Ok(ctx)
        }
    }

    /// Asynchronous version of [`Recorder::callback`].
    pub fn async_callback<E: Message>(
        &self,
        mark: &str,
    ) -> impl Fn(AsyncContext<E>) -> Ready<AsyncOutcome<E>> + Send + Sync + 'static {
        let recorder = self.clone();
        let mark = mark.to_string();
        move |ctx| {
            recorder.record(mark.clone());
            future::ready(Ok(ctx))
        }
    }
}

// ============================================================================
// Counter
// ============================================================================

/// Invocation counter shared between clones.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    count: Arc<AtomicUsize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    /// Callback counting its invocations.
    pub fn callback<E: Message>(&self) -> impl Fn(Context<E>) -> Outcome<E> + Send + Sync + 'static {
        let count = Arc::clone(&self.count);
        move |ctx| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(ctx)
        }
    }

    /// Asynchronous version of [`Counter::callback`].
    pub fn async_callback<E: Message>(
        &self,
    ) -> impl Fn(AsyncContext<E>) -> Ready<AsyncOutcome<E>> + Send + Sync + 'static {
        let count = Arc::clone(&self.count);
        move |ctx| {
            count.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok(ctx))
        }
    }
}

// ============================================================================
// Recording Port
// ============================================================================

/// In-memory [`ClientPort`].
///
/// Records every request and answers with the configured response, an empty
/// `200` unless told otherwise. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingPort {
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    response: HttpResponse,
    failure: Option<String>,
    started: Arc<AtomicBool>,
}

impl RecordingPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with `response`.
    pub fn respond(mut self, response: HttpResponse) -> Self {
        self.response = response;
        self
    }

    /// Fail every request with `message`.
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }
}

impl ClientPort for RecordingPort {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
        if let Some(message) = &self.failure {
            return Err(message.clone().into());
        }
        lock(&self.requests).push(request.clone());
        Ok(self.response.clone())
    }

    fn start(&self) -> Result<(), BoxError> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn shut_down(&self) -> Result<(), BoxError> {
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}
