//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats. Batch commands render into a
//! `String`; the live terminal writes through a [`ConsoleSink`].

use crate::classify::Verdict;
use crate::cli::parser::View;
use crate::config::Config;
use crate::core::Classification;
use crate::dispatch::LineSink;
use crate::error::Error;
use crate::reconstruct::SessionStats;
use crate::transport::PortInfo;
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// One delivered line, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    /// Stream the line was routed to.
    pub stream: Classification,
    /// Line text.
    pub line: String,
}

/// Sink recording every line with its stream, in delivery order.
#[derive(Debug, Clone, Default)]
pub struct TranscriptSink {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptSink {
    /// Recorded lines.
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Consumes the sink, returning its lines.
    #[must_use]
    pub fn into_entries(self) -> Vec<TranscriptEntry> {
        self.entries
    }

    fn record(&mut self, stream: Classification, text: &str) {
        self.entries.extend(text.split('\n').map(|line| TranscriptEntry {
            stream,
            line: line.to_string(),
        }));
    }
}

impl LineSink for TranscriptSink {
    fn on_log_lines(&mut self, text: &str) {
        self.record(Classification::Log, text);
    }

    fn on_command_lines(&mut self, text: &str) {
        self.record(Classification::CommandResponse, text);
    }
}

/// Live terminal sink writing timestamped lines to `W`.
///
/// The first write error is kept and later output is skipped; callers
/// poll [`write_error`](Self::write_error) to stop when the reader is gone.
#[derive(Debug)]
pub struct ConsoleSink<W> {
    writer: W,
    view: View,
    format: OutputFormat,
    error: Option<std::io::Error>,
}

#[derive(Serialize)]
struct ConsoleRecord<'a> {
    time: &'a str,
    stream: &'a str,
    line: &'a str,
}

impl<W: std::io::Write> ConsoleSink<W> {
    /// Creates a sink showing the streams selected by `view`.
    pub const fn new(writer: W, view: View, format: OutputFormat) -> Self {
        Self {
            writer,
            view,
            format,
            error: None,
        }
    }

    /// Writes a session notice such as connect or disconnect.
    pub fn notice(&mut self, message: &str) {
        self.emit("info", "[INFO] ", message);
    }

    /// Echoes an outgoing command.
    pub fn sent(&mut self, command: &str) {
        self.emit("sent", "> Sent: ", command);
    }

    /// The underlying writer.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// The first error hit while writing, if any.
    pub const fn write_error(&self) -> Option<&std::io::Error> {
        self.error.as_ref()
    }

    fn lines(&mut self, stream: Classification, text: &str) {
        if !self.view.shows(stream) {
            return;
        }
        let label = format!("[{}] ", stream.stream());
        for line in text.split('\n') {
            self.emit(stream.stream(), &label, line);
        }
    }

    fn emit(&mut self, stream: &str, prefix: &str, line: &str) {
        if self.error.is_some() {
            return;
        }
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        let mut record = match self.format {
            OutputFormat::Text => format!("{time} {prefix}{line}"),
            OutputFormat::Json => serde_json::to_string(&ConsoleRecord {
                time: &time,
                stream,
                line,
            })
            .unwrap_or_else(|_| "{}".to_string()),
        };
        record.push('\n');
        if let Err(e) = self
            .writer
            .write_all(record.as_bytes())
            .and_then(|()| self.writer.flush())
        {
            tracing::debug!(error = %e, "console output failed");
            self.error = Some(e);
        }
    }
}

impl<W: std::io::Write> LineSink for ConsoleSink<W> {
    fn on_log_lines(&mut self, text: &str) {
        self.lines(Classification::Log, text);
    }

    fn on_command_lines(&mut self, text: &str) {
        self.lines(Classification::CommandResponse, text);
    }
}

/// Formats the port list.
#[must_use]
pub fn format_ports(ports: &[PortInfo], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_ports_text(ports),
        OutputFormat::Json => format_json(&ports),
    }
}

fn format_ports_text(ports: &[PortInfo]) -> String {
    if ports.is_empty() {
        return "No serial ports found.\n".to_string();
    }

    let mut output = String::new();
    let _ = writeln!(output, "{:<24} {:<10} {:<11} Description", "Port", "Type", "VID:PID");
    output.push_str(&"-".repeat(70));
    output.push('\n');
    for port in ports {
        let ids = match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => format!("{vid:04x}:{pid:04x}"),
            _ => "-".to_string(),
        };
        let description = [port.manufacturer.as_deref(), port.product.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            output,
            "{:<24} {:<10} {:<11} {}",
            port.name,
            port.port_type,
            ids,
            if description.is_empty() { "-" } else { &description }
        );
    }
    output
}

/// Result of replaying a capture.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Capture name.
    pub source: String,
    /// Lines in delivery order.
    pub lines: Vec<TranscriptEntry>,
    /// Session counters.
    pub stats: SessionStats,
}

/// Formats a replay report.
#[must_use]
pub fn format_replay(report: &ReplayReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for entry in &report.lines {
                let _ = writeln!(output, "[{}] {}", entry.stream.stream(), entry.line);
            }
            output.push('\n');
            output.push_str(&format_stats_text(&report.stats));
            output
        }
        OutputFormat::Json => format_json(report),
    }
}

/// Formats session counters.
#[must_use]
pub fn format_stats(stats: &SessionStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_stats_text(stats),
        OutputFormat::Json => format_json(stats),
    }
}

fn format_stats_text(stats: &SessionStats) -> String {
    let mut output = String::new();
    output.push_str("Session\n");
    output.push_str("=======\n");
    let _ = writeln!(output, "  Chunks:          {}", stats.chunks);
    let _ = writeln!(output, "  Bytes:           {}", stats.bytes);
    let _ = writeln!(
        output,
        "  Lines:           {} (log {}, command {})",
        stats.lines, stats.log_lines, stats.command_lines
    );
    let _ = writeln!(output, "  Fragments:       {}", stats.fragments);
    let _ = writeln!(output, "  Forced flushes:  {}", stats.forced_flushes);
    let _ = writeln!(output, "  Truncations:     {}", stats.truncations);
    let _ = writeln!(output, "  Dropped chunks:  {}", stats.dropped_chunks);
    output
}

/// Formats a classification verdict.
#[must_use]
pub fn format_verdict(line: &str, verdict: &Verdict, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "Stream:   {}", verdict.classification);
            let _ = writeln!(output, "Rule:     {}", verdict.rule.name());
            let _ = writeln!(
                output,
                "Demoted:  {}",
                if verdict.demoted { "yes" } else { "no" }
            );
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Classified<'a> {
                line: &'a str,
                #[serde(flatten)]
                verdict: &'a Verdict,
            }
            format_json(&Classified { line, verdict })
        }
    }
}

/// Formats stripped text.
#[must_use]
pub fn format_stripped(text: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => text.to_string(),
        OutputFormat::Json => format_json(&serde_json::json!({ "text": text })),
    }
}

/// Formats the effective configuration. Always JSON.
#[must_use]
pub fn format_config(config: &Config) -> String {
    let mut output = format_json(config);
    output.push('\n');
    output
}

/// Formats an error for display.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => format_json(&serde_json::json!({
            "success": false,
            "error": error.to_string(),
        })),
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classifier, EchoHistory};
    use crate::error::TransportError;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("unknown"), OutputFormat::Text);
    }

    #[test]
    fn test_console_sink_text() {
        let mut sink = ConsoleSink::new(Vec::new(), View::Both, OutputFormat::Text);
        sink.on_log_lines("<inf> a\n<inf> b");
        sink.on_command_lines("version");
        sink.sent("version");
        let text = String::from_utf8(sink.writer().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with(" [log] <inf> a"));
        assert!(lines[2].ends_with(" [command] version"));
        assert!(lines[3].ends_with(" > Sent: version"));
        // HH:MM:SS prefix
        assert_eq!(lines[0].as_bytes()[2], b':');
        assert_eq!(lines[0].as_bytes()[5], b':');
    }

    #[test]
    fn test_console_sink_view_filter() {
        let mut sink = ConsoleSink::new(Vec::new(), View::Command, OutputFormat::Text);
        sink.on_log_lines("<inf> hidden");
        sink.on_command_lines("shown");
        let text = String::from_utf8(sink.writer().clone()).unwrap();
        assert!(!text.contains("hidden"));
        assert!(text.contains("shown"));
    }

    #[test]
    fn test_console_sink_json() {
        let mut sink = ConsoleSink::new(Vec::new(), View::Both, OutputFormat::Json);
        sink.notice("connected");
        let text = String::from_utf8(sink.writer().clone()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["stream"], "info");
        assert_eq!(value["line"], "connected");
    }

    /// Writer whose reader has gone away.
    #[derive(Debug, Default)]
    struct ClosedPipe {
        attempts: usize,
    }

    impl std::io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            self.attempts += 1;
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_console_sink_keeps_first_write_error() {
        let mut sink = ConsoleSink::new(ClosedPipe::default(), View::Both, OutputFormat::Text);
        assert!(sink.write_error().is_none());
        sink.on_log_lines("<inf> a\n<inf> b");
        sink.notice("disconnected");
        assert_eq!(
            sink.write_error().map(std::io::Error::kind),
            Some(std::io::ErrorKind::BrokenPipe)
        );
        assert_eq!(sink.writer().attempts, 1);
    }

    #[test]
    fn test_transcript_sink_order() {
        let mut sink = TranscriptSink::default();
        sink.on_log_lines("a\nb");
        sink.on_command_lines("c");
        let streams: Vec<_> = sink.entries().iter().map(|e| e.stream).collect();
        assert_eq!(
            streams,
            vec![
                Classification::Log,
                Classification::Log,
                Classification::CommandResponse
            ]
        );
    }

    #[test]
    fn test_format_ports() {
        assert_eq!(format_ports(&[], OutputFormat::Text), "No serial ports found.\n");
        let ports = vec![PortInfo {
            name: "/dev/ttyACM0".to_string(),
            port_type: "USB".to_string(),
            manufacturer: Some("SEGGER".to_string()),
            product: Some("J-Link".to_string()),
            serial_number: None,
            vid: Some(0x1366),
            pid: Some(0x1051),
        }];
        let text = format_ports(&ports, OutputFormat::Text);
        assert!(text.contains("1366:1051"));
        assert!(text.contains("SEGGER J-Link"));
        let json = format_ports(&ports, OutputFormat::Json);
        assert!(json.contains("\"name\": \"/dev/ttyACM0\""));
    }

    #[test]
    fn test_format_verdict() {
        let verdict = Classifier::default().classify_with_recovery("version", &EchoHistory::new(0));
        let text = format_verdict("version", &verdict, OutputFormat::Text);
        assert!(text.contains("Rule:     fallback"));
        assert!(text.contains("Demoted:  yes"));
        let json = format_verdict("version", &verdict, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["classification"], "log");
        assert_eq!(value["rule"], "fallback");
        assert_eq!(value["line"], "version");
    }

    #[test]
    fn test_format_stats() {
        let stats = SessionStats {
            chunks: 3,
            lines: 2,
            log_lines: 1,
            command_lines: 1,
            ..SessionStats::default()
        };
        let text = format_stats(&stats, OutputFormat::Text);
        assert!(text.contains("Lines:           2 (log 1, command 1)"));
        let json = format_stats(&stats, OutputFormat::Json);
        assert!(json.contains("\"chunks\": 3"));
    }

    #[test]
    fn test_format_error() {
        let error = Error::from(TransportError::NotOpen);
        assert_eq!(
            format_error(&error, OutputFormat::Text),
            "transport error: port is not open"
        );
        let json = format_error(&error, OutputFormat::Json);
        assert!(json.contains("\"success\": false"));
    }
}
