//! Heuristic splitting of oversized lines.
//!
//! A line longer than the configured maximum usually means several messages
//! arrived without newlines between them. The splitter cuts on runs of
//! whitespace, pipes, `][` boundaries and isolated `x` sentinels, then
//! regroups short pieces. It is best-effort and may lose noise-sized parts.

use crate::config::PipelineConfig;
use crate::core::LogicalLine;
use crate::io::split_at_char_limit;
use regex::Regex;
use std::sync::OnceLock;

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| {
        Regex::new(r"(\]\[)|\s{2,}|\||(?:^|\s+)x(?:\s+|$)").expect("valid regex")
    })
}

/// Splits an oversized line into plausible sub-messages.
///
/// # Examples
///
/// ```
/// use shell_sift::reconstruct::FragmentSplitter;
///
/// let splitter = FragmentSplitter::new(32);
/// let parts: Vec<String> = splitter
///     .split("[00:01] <inf> first][00:02] <inf> second")
///     .into_iter()
///     .map(|f| f.into_text())
///     .collect();
/// assert_eq!(parts, ["[00:01] <inf> first]", "[00:02] <inf> second"]);
/// ```
#[derive(Debug, Clone)]
pub struct FragmentSplitter {
    max_line_length: usize,
    min_part_length: usize,
    min_self_contained_length: usize,
    fragment_emit_length: usize,
    min_fragment_length: usize,
}

impl Default for FragmentSplitter {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl FragmentSplitter {
    /// Creates a splitter with default thresholds and the given line cap.
    #[must_use]
    pub fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            ..Self::default()
        }
    }

    /// Creates a splitter from pipeline tunables.
    #[must_use]
    pub const fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_line_length: config.max_line_length,
            min_part_length: config.min_part_length,
            min_self_contained_length: config.min_self_contained_length,
            fragment_emit_length: config.fragment_emit_length,
            min_fragment_length: config.min_fragment_length,
        }
    }

    /// Whether `line` exceeds the line cap.
    #[must_use]
    pub fn needs_split(&self, line: &str) -> bool {
        line.chars().count() > self.max_line_length
    }

    /// Splits `line` into fragments, none longer than the line cap.
    #[must_use]
    pub fn split(&self, line: &str) -> Vec<LogicalLine> {
        let mut fragments = Vec::new();
        let mut running = String::new();
        let mut running_chars = 0;

        for part in parts(line) {
            let part = part.trim();
            let len = part.chars().count();
            if len <= self.min_part_length {
                continue;
            }

            let self_contained =
                part.contains('[') || part.contains('<') || len > self.min_self_contained_length;
            if self_contained && len <= self.max_line_length {
                self.emit(part, &mut fragments);
                continue;
            }

            if !running.is_empty() {
                running.push(' ');
                running_chars += 1;
            }
            running.push_str(part);
            running_chars += len;
            if running_chars >= self.fragment_emit_length {
                self.emit(&running, &mut fragments);
                running.clear();
                running_chars = 0;
            }
        }

        if running_chars >= self.min_fragment_length {
            self.emit(&running, &mut fragments);
        }
        fragments
    }

    fn emit(&self, text: &str, fragments: &mut Vec<LogicalLine>) {
        for piece in split_at_char_limit(text, self.max_line_length) {
            if let Some(fragment) = LogicalLine::fragment(piece, fragments.len()) {
                fragments.push(fragment);
            }
        }
    }
}

/// Cuts `line` at separators; a `][` boundary keeps both brackets.
fn parts(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for caps in separator().captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        if caps.get(1).is_some() {
            let cut = whole.start() + 1;
            parts.push(&line[start..cut]);
            start = cut;
        } else {
            parts.push(&line[start..whole.start()]);
            start = whole.end();
        }
    }
    parts.push(&line[start..]);
    parts
}
