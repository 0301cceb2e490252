//! Timeout filter for the asynchronous engine.

use std::time::Duration;
use trellis_core::{AsyncContext, AsyncHandler, HandlerError, Predicate, Routable};

/// Filter bounding the time the rest of the chain below `predicate` may take.
///
/// When the limit is hit the pending handlers are dropped, so none of them
/// runs any further, and the context that entered the filter continues with
/// a [`HandlerError::Timeout`] exception. Exception handlers declared before
/// the filter can turn it into a response.
pub fn timeout<E: Routable>(predicate: Predicate<E>, duration: Duration) -> AsyncHandler<E> {
    AsyncHandler::filter(predicate, move |ctx: AsyncContext<E>| async move {
        let entered = ctx.clone();
        match tokio::time::timeout(duration, ctx.next()).await {
            Ok(ctx) => Ok(ctx),
            Err(_) => {
                tracing::warn!(
                    path = entered.event().path(),
                    timeout_ms = duration.as_millis() as u64,
                    "handler chain timed out"
                );
                Ok(entered.with_exception(HandlerError::Timeout(duration)))
            }
        }
    })
}

/// [`timeout`] for every path, in whole seconds.
pub fn timeout_secs<E: Routable>(secs: u64) -> AsyncHandler<E> {
    timeout(Predicate::any(), Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Counter;
    use trellis_core::AsyncDispatcher;

    #[tokio::test]
    async fn test_slow_chain_times_out() {
        let counter = Counter::new();
        let dispatcher = AsyncDispatcher::new([
            timeout(Predicate::any(), Duration::from_millis(10)),
            AsyncHandler::on(Predicate::any(), |ctx: AsyncContext<String>| async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(ctx)
            }),
            AsyncHandler::on(Predicate::any(), counter.async_callback()),
        ])
        .unwrap();

        let ctx = dispatcher.process("/slow".to_string()).await;
        let exception = ctx.exception().expect("timeout recorded");
        assert!(matches!(
            exception.downcast_ref::<HandlerError>(),
            Some(HandlerError::Timeout(_))
        ));
        assert_eq!(counter.count(), 0);
    }

    #[tokio::test]
    async fn test_fast_chain_passes() {
        let counter = Counter::new();
        let dispatcher = AsyncDispatcher::new([
            timeout_secs(5),
            AsyncHandler::on(Predicate::any(), counter.async_callback()),
        ])
        .unwrap();

        let ctx = dispatcher.process("/fast".to_string()).await;
        assert!(ctx.exception().is_none());
        assert_eq!(counter.count(), 1);
    }
}
