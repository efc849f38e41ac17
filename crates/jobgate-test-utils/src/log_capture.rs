//! Thread-scoped capture of `tracing` events for asserting on logs.
//!
//! [`LogCollector`] is a `tracing_subscriber` layer buffering events in
//! memory. [`capture`] installs it as the default subscriber for the current
//! thread only, so it works under `#[tokio::test]`'s current-thread runtime
//! without interfering with other tests.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use tracing::dispatcher::DefaultGuard;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// A single captured event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    /// Non-message fields rendered as `name=value`, space separated.
    pub fields: String,
}

/// Layer pushing every event into a shared buffer.
#[derive(Debug, Clone, Default)]
pub struct LogCollector {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl LogCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Entries at exactly `level`.
    pub fn at_level(&self, level: Level) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .collect()
    }

    /// Whether any entry at `level` has a message containing `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.at_level(level)
            .iter()
            .any(|entry| entry.message.contains(needle))
    }
}

impl<S: Subscriber> Layer<S> for LogCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                level: *metadata.level(),
                target: metadata.target().to_string(),
                message: visitor.message,
                fields: visitor.fields.trim_end().to_string(),
            });
        }
    }
}

/// Install a fresh collector for the current thread.
///
/// Events are captured until the returned guard is dropped.
pub fn capture() -> (LogCollector, DefaultGuard) {
    let collector = LogCollector::new();
    let guard = tracing_subscriber::registry()
        .with(collector.clone())
        .set_default();
    (collector, guard)
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: String,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, "{}={value:?} ", field.name());
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, "{}={value} ", field.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_level_message_and_fields() {
        let (logs, _guard) = capture();

        tracing::info!(route = "feature:listDaemons", "route registered");
        tracing::error!(command = %"scheduleJob", "no handler");

        let entries = logs.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, Level::INFO);
        assert_eq!(entries[0].message, "route registered");
        assert_eq!(entries[0].fields, "route=feature:listDaemons");
        assert!(logs.contains(Level::ERROR, "no handler"));
        assert!(!logs.contains(Level::WARN, "no handler"));
    }

    #[test]
    fn test_capture_is_scoped_to_guard() {
        let (logs, guard) = capture();
        drop(guard);
        tracing::warn!("not captured");
        assert!(logs.entries().is_empty());
    }
}
