//! The reconstruction state machine.
//!
//! A [`ReconstructionSession`] owns the accumulation buffer and the single
//! pending flush deadline. It is driven from two entry points:
//! [`on_chunk`](ReconstructionSession::on_chunk) when bytes arrive and
//! [`on_tick`](ReconstructionSession::on_tick) from an external clock. Time
//! is always passed in, so the session never reads a clock itself.

use super::buffer::AccumulationBuffer;
use super::splitter::FragmentSplitter;
use crate::classify::{Classifier, EchoHistory};
use crate::config::{CompiledVocabulary, PipelineConfig};
use crate::core::{Classification, LineOrigin, LogicalLine};
use crate::dispatch::DispatchBatch;
use crate::filter::{normalize_line_breaks, split_incomplete_escape, strip, strip_prompts};
use crate::io::decode_chunk;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Longest partial line still checked for being a bare prompt.
const MAX_PROMPT_LEN: usize = 64;

/// An armed single-shot flush deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFlush {
    /// When buffered data is force-processed.
    pub deadline: Instant,
}

impl PendingFlush {
    /// Whether the deadline has passed at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// Reconstructor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushState {
    /// No data waiting for a terminator.
    #[default]
    Idle,
    /// Data buffered; flush timer armed.
    Awaiting(PendingFlush),
}

/// Running counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Chunks received.
    pub chunks: usize,
    /// Raw bytes received.
    pub bytes: usize,
    /// Lines dispatched, fragments included.
    pub lines: usize,
    /// Lines dispatched to the log stream.
    pub log_lines: usize,
    /// Lines dispatched to the command stream.
    pub command_lines: usize,
    /// Fragments produced by the splitter.
    pub fragments: usize,
    /// Deadline-triggered flushes.
    pub forced_flushes: usize,
    /// Buffer overflows.
    pub truncations: usize,
    /// Chunks discarded because no decoding produced text.
    pub dropped_chunks: usize,
}

/// Turns a chunked byte stream into classified, batched lines.
///
/// # Examples
///
/// ```
/// use shell_sift::reconstruct::ReconstructionSession;
/// use std::time::{Duration, Instant};
///
/// let mut session = ReconstructionSession::default();
/// let start = Instant::now();
///
/// let batch = session.on_chunk(b"<inf> boot ", start);
/// assert!(batch.is_empty());
/// assert!(session.deadline().is_some());
///
/// let batch = session.on_chunk(b"done\r\n", start + Duration::from_millis(5));
/// assert_eq!(batch.log_lines(), ["<inf> boot done"]);
/// assert!(session.deadline().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ReconstructionSession {
    classifier: Classifier,
    splitter: FragmentSplitter,
    buffer: AccumulationBuffer,
    pending_escape: String,
    state: FlushState,
    flush_timeout: Duration,
    echoes: EchoHistory,
    stats: SessionStats,
}

impl Default for ReconstructionSession {
    fn default() -> Self {
        Self::new(&PipelineConfig::default(), CompiledVocabulary::default())
    }
}

impl ReconstructionSession {
    /// Creates a session from tunables and a compiled vocabulary.
    #[must_use]
    pub fn new(config: &PipelineConfig, vocabulary: CompiledVocabulary) -> Self {
        Self::with_classifier(config, Classifier::new(vocabulary))
    }

    /// Creates a session around an existing classifier.
    #[must_use]
    pub fn with_classifier(config: &PipelineConfig, classifier: Classifier) -> Self {
        Self {
            classifier,
            splitter: FragmentSplitter::from_config(config),
            buffer: AccumulationBuffer::new(config.max_accumulated_size, config.retain_size()),
            pending_escape: String::new(),
            state: FlushState::Idle,
            flush_timeout: config.flush_timeout(),
            echoes: EchoHistory::new(config.echo_history),
            stats: SessionStats::default(),
        }
    }

    /// Handles a chunk of raw bytes received at `now`.
    ///
    /// Returns the lines completed by this chunk, which is empty while the
    /// buffer still lacks a trailing terminator.
    pub fn on_chunk(&mut self, bytes: &[u8], now: Instant) -> DispatchBatch {
        self.stats.chunks += 1;
        self.stats.bytes += bytes.len();

        let Some((text, decoding)) = decode_chunk(bytes) else {
            if !bytes.is_empty() {
                self.stats.dropped_chunks += 1;
                debug!(bytes = bytes.len(), "dropped undecodable chunk");
            }
            return DispatchBatch::new();
        };
        trace!(bytes = bytes.len(), ?decoding, "decoded chunk");

        // An escape sequence cut by the read boundary is stripped with the next read
        let mut text_with_carry = std::mem::take(&mut self.pending_escape);
        text_with_carry.push_str(&text);
        let (complete, pending) = split_incomplete_escape(&text_with_carry);
        self.pending_escape = pending.to_string();

        let cleaned = normalize_line_breaks(&strip(complete));
        let dropped = self.buffer.push_str(&cleaned);
        if dropped > 0 {
            self.stats.truncations += 1;
            debug!(
                dropped,
                retained = self.buffer.len(),
                "accumulation buffer truncated"
            );
        }

        if self.buffer.is_empty() {
            self.state = FlushState::Idle;
            return DispatchBatch::new();
        }
        if self.buffer.ends_with_newline() || self.ends_with_prompt() {
            self.state = FlushState::Idle;
            return self.process(false);
        }
        self.state = FlushState::Awaiting(PendingFlush {
            deadline: now + self.flush_timeout,
        });
        DispatchBatch::new()
    }

    /// Checks the flush deadline at `now`, force-processing if it is due.
    pub fn on_tick(&mut self, now: Instant) -> DispatchBatch {
        match self.state {
            FlushState::Awaiting(pending) if pending.is_due(now) => self.flush_now(),
            _ => DispatchBatch::new(),
        }
    }

    /// Force-processes whatever is buffered and returns to idle.
    pub fn flush_now(&mut self) -> DispatchBatch {
        self.state = FlushState::Idle;
        self.pending_escape.clear();
        if self.buffer.is_empty() {
            return DispatchBatch::new();
        }
        self.stats.forced_flushes += 1;
        debug!(chars = self.buffer.len(), "force-flushing buffer");
        self.process(true)
    }

    /// The armed flush deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        match self.state {
            FlushState::Idle => None,
            FlushState::Awaiting(pending) => Some(pending.deadline),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> FlushState {
        self.state
    }

    /// Remembers a sent command so its echo is not taken for log noise.
    pub fn note_sent_command(&mut self, command: &str) {
        self.echoes.record(command);
    }

    /// Text buffered and not yet dispatched.
    #[must_use]
    pub fn buffered(&self) -> &str {
        self.buffer.as_str()
    }

    /// Counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The classifier in use.
    #[must_use]
    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Whether the text after the last line break is nothing but a prompt.
    fn ends_with_prompt(&self) -> bool {
        let text = self.buffer.as_str();
        let tail = text.rsplit_once('\n').map_or(text, |(_, tail)| tail);
        tail.len() <= MAX_PROMPT_LEN
            && strip_prompts(tail, self.classifier.vocabulary()).is_empty()
    }

    /// Prompts are removed here, on whole lines, so the result does not
    /// depend on where reads were cut.
    fn process(&mut self, forced: bool) -> DispatchBatch {
        let text = strip_prompts(&self.buffer.take(), self.classifier.vocabulary());
        let segments: Vec<&str> = text.split('\n').collect();
        let last = segments.len().saturating_sub(1);
        let mut batch = DispatchBatch::new();

        for (i, segment) in segments.into_iter().enumerate() {
            let origin = if forced && i == last {
                LineOrigin::Forced
            } else {
                LineOrigin::Terminated
            };
            let Some(line) = LogicalLine::new(segment, origin) else {
                continue;
            };

            if self.splitter.needs_split(line.text()) {
                let fragments = self.splitter.split(line.text());
                debug!(
                    chars = line.char_len(),
                    fragments = fragments.len(),
                    "split oversized line"
                );
                self.stats.fragments += fragments.len();
                for fragment in fragments {
                    self.route(fragment, &mut batch);
                }
            } else {
                self.route(line, &mut batch);
            }
        }
        batch
    }

    fn route(&mut self, line: LogicalLine, batch: &mut DispatchBatch) {
        let verdict = self
            .classifier
            .classify_with_recovery(line.text(), &self.echoes);
        self.stats.lines += 1;
        match verdict.classification {
            Classification::Log => self.stats.log_lines += 1,
            Classification::CommandResponse => self.stats.command_lines += 1,
        }
        batch.dispatch(line, verdict.classification);
    }
}
