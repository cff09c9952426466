//! Terminal driver.
//!
//! Ties a [`Transport`], a [`ReconstructionSession`] and a [`LineSink`]
//! together. The driver is cooperative and single-threaded: each
//! [`pump`](Terminal::pump) reads at most one chunk, checks the flush
//! deadline and delivers whatever was completed.

use crate::config::PipelineConfig;
use crate::dispatch::{DispatchBatch, LineSink};
use crate::error::{CommandError, Result, TransportError};
use crate::reconstruct::{ReconstructionSession, SessionStats};
use crate::transport::Transport;
use std::time::{Duration, Instant};
use tracing::info;

/// A transport, its reconstruction session and the sink it feeds.
///
/// # Examples
///
/// ```
/// use shell_sift::config::PipelineConfig;
/// use shell_sift::dispatch::CollectingSink;
/// use shell_sift::reconstruct::ReconstructionSession;
/// use shell_sift::terminal::Terminal;
/// use shell_sift::transport::ReplayTransport;
/// use std::time::Instant;
///
/// let transport = ReplayTransport::new(b"uart:~$ kernel version\r\n".to_vec(), 64);
/// let mut terminal = Terminal::new(
///     transport,
///     CollectingSink::new(),
///     ReconstructionSession::default(),
///     &PipelineConfig::default(),
/// );
/// terminal.pump(Instant::now());
/// assert_eq!(terminal.sink().command_lines(), vec!["kernel version"]);
/// ```
#[derive(Debug)]
pub struct Terminal<T, S> {
    transport: T,
    sink: S,
    session: ReconstructionSession,
    line_ending: String,
    poll_interval: Duration,
}

impl<T: Transport, S: LineSink> Terminal<T, S> {
    /// Creates a driver.
    #[must_use]
    pub fn new(transport: T, sink: S, session: ReconstructionSession, config: &PipelineConfig) -> Self {
        Self {
            transport,
            sink,
            session,
            line_ending: config.line_ending.clone(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Performs one cooperative step at `now`.
    ///
    /// Returns the number of lines delivered to the sink.
    pub fn pump(&mut self, now: Instant) -> usize {
        let mut batch = DispatchBatch::new();
        if self.transport.poll_available() > 0 {
            let chunk = self.transport.read_chunk();
            if !chunk.is_empty() {
                batch.append(self.session.on_chunk(&chunk, now));
            }
        }
        batch.append(self.session.on_tick(now));
        self.deliver(batch)
    }

    /// Force-flushes buffered data, e.g. at end of input.
    pub fn finish(&mut self) -> usize {
        let batch = self.session.flush_now();
        self.deliver(batch)
    }

    /// Pumps until the transport is exhausted, then flushes.
    ///
    /// Time advances by `step` per pump from `start` instead of being read
    /// from the clock, so a replay is deterministic.
    pub fn drain(&mut self, start: Instant, step: Duration) -> usize {
        let mut now = start;
        let mut delivered = 0;
        while self.transport.is_open() && self.transport.poll_available() > 0 {
            delivered += self.pump(now);
            now += step;
        }
        delivered + self.finish()
    }

    /// Sends `command` followed by the configured line ending.
    ///
    /// The command is trimmed first and must not be empty. A write that
    /// accepts fewer bytes than the payload is a
    /// [`TransportError::ShortWrite`].
    pub fn send_command(&mut self, command: &str) -> Result<usize> {
        let command = command.trim();
        if command.is_empty() {
            return Err(CommandError::InvalidArgument("command is empty".to_string()).into());
        }
        let payload = format!("{command}{}", self.line_ending);
        let written = self.transport.write(payload.as_bytes())?;
        if written != payload.len() {
            return Err(TransportError::ShortWrite {
                written,
                expected: payload.len(),
            }
            .into());
        }
        self.session.note_sent_command(command);
        info!(command, bytes = written, "command sent");
        Ok(written)
    }

    /// Poll cadence for live loops.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Session counters.
    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        self.session.stats()
    }

    /// The sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// The sink, mutably.
    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably.
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The reconstruction session.
    #[must_use]
    pub const fn session(&self) -> &ReconstructionSession {
        &self.session
    }

    /// Consumes the driver, returning transport and sink.
    pub fn into_parts(self) -> (T, S) {
        (self.transport, self.sink)
    }

    fn deliver(&mut self, batch: DispatchBatch) -> usize {
        let count = batch.len();
        batch.deliver(&mut self.sink);
        count
    }
}
