//! Ready-made filters.
//!
//! - [`logging`]: request spans and completion events through `tracing`
//! - `timeout`: bound the time the rest of an asynchronous chain may take
//!   (feature `timeout`)

pub mod logging;
#[cfg(feature = "timeout")]
pub mod timeout;
