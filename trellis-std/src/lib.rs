//! # trellis-std
//!
//! HTTP layer for the Trellis handler chain engine.
//!
//! This crate provides:
//! - **HTTP model**: [`http::HttpRequest`], [`http::HttpResponse`] and the
//!   [`http::HttpCall`] event routed by path
//! - **Route DSL**: [`routes`] builders (`get`, `path`, `filter`, ...) and
//!   their asynchronous twins in [`routes::future`]
//! - **Dispatchers**: [`dispatcher::HttpDispatcher`] and
//!   [`dispatcher::AsyncHttpDispatcher`] mapping outcomes to responses
//! - **Client**: [`client::HttpClient`] over a [`client::ClientPort`]
//! - **Standard filters**: logging, timeout
//! - **Tower interop** (feature `tower`)

#![deny(clippy::wildcard_imports)]

pub use trellis_core;

pub mod client;
pub mod dispatcher;
pub mod hooks;
pub mod http;
pub mod routes;
pub mod testing;
#[cfg(feature = "tower")]
pub mod tower;
