//! Metrics stage.
//!
//! Times the wrapped chain and hands `(request type, elapsed)` to the
//! configured [`MetricsSink`]. One record per dispatch attempt that gets past
//! validation, whatever the outcome.

use mediator_core::{BoxFuture, Handler, HandlerResult, MetricsSink, Request};
use std::sync::Arc;
use std::time::Instant;

/// Records elapsed wall-clock time of the wrapped chain.
///
/// Sits inside the validation stage, so a dispatch rejected by validation
/// never reaches it and records no sample. Those rejections are counted by
/// `mediator_validation_failures_total` instead.
pub struct MetricsStage<R: Request, C> {
    inner: Arc<dyn Handler<R, C>>,
    sink: Arc<dyn MetricsSink>,
}

impl<R: Request, C> MetricsStage<R, C> {
    /// Wrap `inner`, reporting to `sink`
    #[must_use]
    pub fn new(inner: Arc<dyn Handler<R, C>>, sink: Arc<dyn MetricsSink>) -> Self {
        Self { inner, sink }
    }
}

impl<R, C> Handler<R, C> for MetricsStage<R, C>
where
    R: Request,
    C: Send + Sync + 'static,
{
    fn handle<'a>(&'a self, request: R, ctx: &'a C) -> BoxFuture<'a, HandlerResult<R>> {
        Box::pin(async move {
            let timer = Timer::start(self.sink.as_ref(), R::type_name());
            let outcome = self.inner.handle(request, ctx).await;
            drop(timer);
            outcome
        })
    }
}

/// Records on drop, so a dispatch abandoned mid-flight still produces its record.
struct Timer<'a> {
    sink: &'a dyn MetricsSink,
    name: &'static str,
    started: Instant,
}

impl<'a> Timer<'a> {
    fn start(sink: &'a dyn MetricsSink, name: &'static str) -> Self {
        Self {
            sink,
            name,
            started: Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.sink.record(self.name, self.started.elapsed());
    }
}
