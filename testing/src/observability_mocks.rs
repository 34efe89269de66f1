//! Recording metrics sink and log context
//!
//! Both capture what the pipeline reported so tests can assert on it. Clones
//! share their recordings.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use mediator_core::{LogContext, LogScope, MetricsSink};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Span;

/// One captured timing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRecord {
    /// Request type name
    pub name: String,
    /// Elapsed time reported
    pub elapsed: Duration,
}

/// [`MetricsSink`] that keeps every record.
#[derive(Clone, Debug, Default)]
pub struct RecordingMetricsSink {
    records: Arc<Mutex<Vec<MetricRecord>>>,
}

impl RecordingMetricsSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record so far, in order
    #[must_use]
    pub fn records(&self) -> Vec<MetricRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Number of records for `name`
    #[must_use]
    pub fn count_for(&self, name: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.name == name)
            .count()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn record(&self, name: &str, elapsed: Duration) {
        self.records.lock().unwrap().push(MetricRecord {
            name: name.to_string(),
            elapsed,
        });
    }
}

#[derive(Debug, Default)]
struct Properties {
    next_id: u64,
    active: Vec<(u64, String, String)>,
    released: Vec<(String, String)>,
    pushes: usize,
}

/// [`LogContext`] that tracks which properties are active.
///
/// # Example
///
/// ```
/// use mediator_core::LogContext;
/// use mediator_testing::RecordingLogContext;
///
/// let log = RecordingLogContext::new();
/// let scope = log.push_property("request_type", "Ping");
/// assert_eq!(log.active("request_type").as_deref(), Some("Ping"));
///
/// drop(scope);
/// assert_eq!(log.active("request_type"), None);
/// assert_eq!(log.releases(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RecordingLogContext {
    properties: Arc<Mutex<Properties>>,
}

impl RecordingLogContext {
    /// Create a context with nothing pushed
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Innermost active value for `key`
    #[must_use]
    pub fn active(&self, key: &str) -> Option<String> {
        self.properties
            .lock()
            .unwrap()
            .active
            .iter()
            .rev()
            .find(|(_, k, _)| k == key)
            .map(|(_, _, value)| value.clone())
    }

    /// Properties pushed so far
    #[must_use]
    pub fn pushes(&self) -> usize {
        self.properties.lock().unwrap().pushes
    }

    /// Properties released so far
    #[must_use]
    pub fn releases(&self) -> usize {
        self.properties.lock().unwrap().released.len()
    }

    /// Released `(key, value)` pairs, in release order
    #[must_use]
    pub fn released(&self) -> Vec<(String, String)> {
        self.properties.lock().unwrap().released.clone()
    }
}

impl LogContext for RecordingLogContext {
    fn push_property(&self, key: &str, value: &str) -> LogScope {
        let id = {
            let mut properties = self.properties.lock().unwrap();
            let id = properties.next_id;
            properties.next_id += 1;
            properties.pushes += 1;
            properties.active.push((id, key.to_string(), value.to_string()));
            id
        };

        let properties = Arc::clone(&self.properties);
        LogScope::new(Span::none()).on_release(move || {
            let mut properties = properties.lock().unwrap();
            if let Some(index) = properties.active.iter().position(|(entry, _, _)| *entry == id) {
                let (_, key, value) = properties.active.remove(index);
                properties.released.push((key, value));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_counts_by_name() {
        let sink = RecordingMetricsSink::new();
        sink.record("A", Duration::from_millis(1));
        sink.record("B", Duration::from_millis(2));
        sink.record("A", Duration::from_millis(3));

        assert_eq!(sink.count_for("A"), 2);
        assert_eq!(sink.records().len(), 3);
    }

    #[test]
    fn test_nested_properties_release_independently() {
        let log = RecordingLogContext::new();
        let outer = log.push_property("request_type", "Outer");
        let inner = log.push_property("request_type", "Inner");

        assert_eq!(log.active("request_type").as_deref(), Some("Inner"));
        drop(inner);
        assert_eq!(log.active("request_type").as_deref(), Some("Outer"));
        drop(outer);

        assert_eq!(log.active("request_type"), None);
        assert_eq!(
            log.released(),
            vec![
                ("request_type".to_string(), "Inner".to_string()),
                ("request_type".to_string(), "Outer".to_string()),
            ]
        );
    }
}
