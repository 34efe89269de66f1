//! Logging stage - innermost wrapper around the real handler.
//!
//! Pushes the request type onto the log context for exactly the duration of
//! the handler call. The handler future is instrumented with the scope's span,
//! so every `tracing` event the handler emits (directly or through anything it
//! calls) carries the property. The scope is dropped, releasing the property,
//! when the handler returns, fails, or the dispatch is abandoned.

use mediator_core::{BoxFuture, Handler, HandlerResult, LogContext, Request};
use std::sync::Arc;
use tracing::Instrument;

/// Tags log output produced by the wrapped handler with the request type.
pub struct LoggingStage<R: Request, C> {
    inner: Arc<dyn Handler<R, C>>,
    log: Arc<dyn LogContext>,
    property: Arc<str>,
}

impl<R: Request, C> LoggingStage<R, C> {
    /// Wrap `inner`, pushing `property = <request type>` on `log`
    #[must_use]
    pub fn new(inner: Arc<dyn Handler<R, C>>, log: Arc<dyn LogContext>, property: Arc<str>) -> Self {
        Self {
            inner,
            log,
            property,
        }
    }
}

impl<R, C> Handler<R, C> for LoggingStage<R, C>
where
    R: Request,
    C: Send + Sync + 'static,
{
    fn handle<'a>(&'a self, request: R, ctx: &'a C) -> BoxFuture<'a, HandlerResult<R>> {
        Box::pin(async move {
            let scope = self.log.push_property(&self.property, R::type_name());
            let span = scope.span().clone();

            let future = span.in_scope(|| self.inner.handle(request, ctx));
            let outcome = future.instrument(span).await;

            drop(scope);
            outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediator_core::{BoxFuture, DispatchError};
    use mediator_testing::RecordingLogContext;

    struct Audit;

    impl Request for Audit {
        type Response = Option<String>;
    }

    /// Reports what the log context held while it ran
    struct Snoop {
        log: RecordingLogContext,
        fail: bool,
    }

    impl Handler<Audit, ()> for Snoop {
        fn handle<'a>(&'a self, _request: Audit, _ctx: &'a ()) -> BoxFuture<'a, HandlerResult<Audit>> {
            Box::pin(async move {
                let seen = self.log.active("request_type");
                if self.fail {
                    Err(DispatchError::handler(std::io::Error::other("boom")))
                } else {
                    Ok(seen)
                }
            })
        }
    }

    fn stage(log: &RecordingLogContext, fail: bool) -> LoggingStage<Audit, ()> {
        let inner = Snoop {
            log: log.clone(),
            fail,
        };
        LoggingStage::new(Arc::new(inner), Arc::new(log.clone()), Arc::from("request_type"))
    }

    #[tokio::test]
    async fn test_property_present_during_handler_and_released_after() {
        let log = RecordingLogContext::new();

        let seen = stage(&log, false).handle(Audit, &()).await;

        assert_eq!(seen.ok().flatten().as_deref(), Some(Audit::type_name()));
        assert_eq!(log.active("request_type"), None);
        assert_eq!(log.pushes(), 1);
        assert_eq!(log.releases(), 1);
    }

    #[tokio::test]
    async fn test_property_released_on_failure() {
        let log = RecordingLogContext::new();

        let result = stage(&log, true).handle(Audit, &()).await;

        assert!(result.is_err());
        assert_eq!(log.active("request_type"), None);
        assert_eq!(log.releases(), 1);
    }
}
