//! Observability seams consumed by the metrics and logging stages.
//!
//! Both seams are handed to the mediator explicitly at startup. Nothing in the
//! pipeline reaches for process-wide logger or metrics state on its own.

use std::fmt;
use std::time::Duration;
use tracing::Span;

/// Receives one timing record per dispatch attempt.
pub trait MetricsSink: Send + Sync {
    /// Record the elapsed wall-clock time of a dispatch attempt for a request type
    fn record(&self, name: &str, elapsed: Duration);
}

/// Sink that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _name: &str, _elapsed: Duration) {}
}

/// Source of scoped log properties.
///
/// `push_property` attaches a key/value pair to log output until the
/// returned [`LogScope`] is dropped.
pub trait LogContext: Send + Sync {
    /// Attach a property for the lifetime of the returned scope
    fn push_property(&self, key: &str, value: &str) -> LogScope;
}

type ReleaseFn = Box<dyn FnOnce() + Send + Sync>;

/// Handle for a pushed log property.
///
/// Carries the `tracing` span that events must be emitted under for the
/// property to appear on them. Dropping the scope releases the property.
///
/// # Example
///
/// ```
/// use mediator_core::LogScope;
///
/// let released = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
/// let flag = released.clone();
///
/// let scope = LogScope::new(tracing::Span::none())
///     .on_release(move || flag.store(true, std::sync::atomic::Ordering::SeqCst));
///
/// drop(scope);
/// assert!(released.load(std::sync::atomic::Ordering::SeqCst));
/// ```
pub struct LogScope {
    span: Span,
    release: Option<ReleaseFn>,
}

impl LogScope {
    /// Create a scope backed by the given span
    #[must_use]
    pub const fn new(span: Span) -> Self {
        Self {
            span,
            release: None,
        }
    }

    /// Run `release` when the scope is dropped
    #[must_use]
    pub fn on_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.release = Some(Box::new(release));
        self
    }

    /// The span carrying the property
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for LogScope {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for LogScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogScope")
            .field("span", &self.span)
            .field("has_release", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_release_runs_exactly_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&releases);

        {
            let _scope = LogScope::new(Span::none())
                .on_release(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            assert_eq!(releases.load(Ordering::SeqCst), 0);
        }

        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scope_without_release_drops_cleanly() {
        let scope = LogScope::new(Span::none());
        assert!(scope.span().is_none());
        drop(scope);
    }

    #[test]
    fn test_noop_sink_accepts_records() {
        NoopMetricsSink.record("Ping", Duration::from_millis(3));
    }
}
