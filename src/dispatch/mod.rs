//! Routing of classified lines to the two output streams.
//!
//! A reconstruction pass collects its lines into a [`DispatchBatch`]. The
//! batch is then delivered to a [`LineSink`] with at most one call per
//! stream, lines joined by `\n`. Within a stream, arrival order is kept.

use crate::core::{Classification, LogicalLine};
use serde::Serialize;
use tracing::trace;

/// Consumer of classified lines.
///
/// Each method receives every line of one reconstruction pass for that
/// stream, joined by `\n`. Neither is called for an empty stream.
pub trait LineSink {
    /// Receives log lines.
    fn on_log_lines(&mut self, text: &str);

    /// Receives command-response lines.
    fn on_command_lines(&mut self, text: &str);
}

impl<S: LineSink + ?Sized> LineSink for &mut S {
    fn on_log_lines(&mut self, text: &str) {
        (**self).on_log_lines(text);
    }

    fn on_command_lines(&mut self, text: &str) {
        (**self).on_command_lines(text);
    }
}

/// Lines from one reconstruction pass, split by stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchBatch {
    log: Vec<String>,
    command: Vec<String>,
}

impl DispatchBatch {
    /// Creates an empty batch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            log: Vec::new(),
            command: Vec::new(),
        }
    }

    /// Routes `line` to the stream named by `classification`.
    pub fn dispatch(&mut self, line: LogicalLine, classification: Classification) {
        let text = line.into_text();
        match classification {
            Classification::Log => self.log.push(text),
            Classification::CommandResponse => self.command.push(text),
        }
    }

    /// Appends every line of `other`, keeping per-stream order.
    pub fn append(&mut self, other: Self) {
        self.log.extend(other.log);
        self.command.extend(other.command);
    }

    /// Log lines in arrival order.
    #[must_use]
    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    /// Command-response lines in arrival order.
    #[must_use]
    pub fn command_lines(&self) -> &[String] {
        &self.command
    }

    /// Total number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.len() + self.command.len()
    }

    /// Whether the batch holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty() && self.command.is_empty()
    }

    /// Delivers the batch: one call per non-empty stream.
    pub fn deliver<S: LineSink + ?Sized>(self, sink: &mut S) {
        trace!(
            log = self.log.len(),
            command = self.command.len(),
            "delivering batch"
        );
        if !self.log.is_empty() {
            sink.on_log_lines(&self.log.join("\n"));
        }
        if !self.command.is_empty() {
            sink.on_command_lines(&self.command.join("\n"));
        }
    }
}

/// Sink that records every delivery, for tests and batch tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectingSink {
    /// Each `on_log_lines` payload.
    pub log_calls: Vec<String>,
    /// Each `on_command_lines` payload.
    pub command_calls: Vec<String>,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            log_calls: Vec::new(),
            command_calls: Vec::new(),
        }
    }

    /// All log lines received, split back into individual lines.
    #[must_use]
    pub fn log_lines(&self) -> Vec<&str> {
        self.log_calls.iter().flat_map(|c| c.split('\n')).collect()
    }

    /// All command-response lines received.
    #[must_use]
    pub fn command_lines(&self) -> Vec<&str> {
        self.command_calls.iter().flat_map(|c| c.split('\n')).collect()
    }
}

impl LineSink for CollectingSink {
    fn on_log_lines(&mut self, text: &str) {
        self.log_calls.push(text.to_string());
    }

    fn on_command_lines(&mut self, text: &str) {
        self.command_calls.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LineOrigin;

    fn line(text: &str) -> LogicalLine {
        LogicalLine::new(text, LineOrigin::Terminated).unwrap()
    }

    #[test]
    fn test_batch_joins_per_stream() {
        let mut batch = DispatchBatch::new();
        batch.dispatch(line("<inf> a"), Classification::Log);
        batch.dispatch(line("version"), Classification::CommandResponse);
        batch.dispatch(line("<inf> b"), Classification::Log);
        assert_eq!(batch.len(), 3);

        let mut sink = CollectingSink::new();
        batch.deliver(&mut sink);
        assert_eq!(sink.log_calls, vec!["<inf> a\n<inf> b"]);
        assert_eq!(sink.command_calls, vec!["version"]);
    }

    #[test]
    fn test_empty_stream_not_called() {
        let mut batch = DispatchBatch::new();
        batch.dispatch(line("<inf> only log"), Classification::Log);
        let mut sink = CollectingSink::new();
        batch.deliver(&mut sink);
        assert_eq!(sink.log_calls.len(), 1);
        assert!(sink.command_calls.is_empty());

        let mut sink = CollectingSink::new();
        DispatchBatch::new().deliver(&mut sink);
        assert_eq!(sink, CollectingSink::new());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut first = DispatchBatch::new();
        first.dispatch(line("one"), Classification::CommandResponse);
        let mut second = DispatchBatch::new();
        second.dispatch(line("two"), Classification::CommandResponse);
        first.append(second);
        assert_eq!(first.command_lines(), ["one", "two"]);
        assert!(first.log_lines().is_empty());
    }

    #[test]
    fn test_collecting_sink_splits_lines() {
        let mut sink = CollectingSink::new();
        sink.on_log_lines("a\nb");
        sink.on_log_lines("c");
        assert_eq!(sink.log_lines(), vec!["a", "b", "c"]);
    }
}
