//! `tracing`-backed log context.

use mediator_core::{LogContext, LogScope};

/// Pushes properties as `tracing` spans.
///
/// The returned scope carries a span with the property recorded on it.
/// Events emitted inside that span (the logging stage instruments the
/// handler future with it) are tagged with the property by any subscriber
/// that renders span fields, the `fmt` subscriber included.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogContext;

impl TracingLogContext {
    /// Create the log context
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LogContext for TracingLogContext {
    fn push_property(&self, key: &str, value: &str) -> LogScope {
        let span = tracing::info_span!("log_context", property = key, value = value);
        LogScope::new(span)
    }
}
