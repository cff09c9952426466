//! Second-chance detection of log lines that lost their level tag.
//!
//! Firmware occasionally drops the `<inf>`-style tag under byte loss,
//! leaving a log line that reads like a command response. Lines the rule
//! list sends to the command stream by fallback are re-checked here and
//! demoted to the log stream if they look like log output.

use super::rules::{Classifier, Rule};
use crate::config::CompiledVocabulary;
use crate::core::Classification;
use regex::Regex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::OnceLock;

/// Lines shorter than this are treated as log debris unless exempt.
pub const MIN_RESPONSE_LENGTH: usize = 10;

fn strict_timestamp() -> &'static Regex {
    static STRICT_TIMESTAMP: OnceLock<Regex> = OnceLock::new();
    STRICT_TIMESTAMP
        .get_or_init(|| Regex::new(r"\[\d{2}:\d{2}:\d{2}(?:[.,]\d+)*\]").expect("valid regex"))
}

fn millisecond_suffix() -> &'static Regex {
    static MILLISECOND_SUFFIX: OnceLock<Regex> = OnceLock::new();
    MILLISECOND_SUFFIX.get_or_init(|| Regex::new(r"\b\d+\s?ms\b").expect("valid regex"))
}

/// Recently sent commands, whose echoes must stay in the command stream.
#[derive(Debug, Clone, Default)]
pub struct EchoHistory {
    commands: VecDeque<String>,
    capacity: usize,
}

impl EchoHistory {
    /// Creates a history remembering at most `capacity` commands.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a sent command, evicting the oldest when full.
    pub fn record(&mut self, command: &str) {
        let command = command.trim();
        if self.capacity == 0 || command.is_empty() {
            return;
        }
        if self.commands.len() == self.capacity {
            self.commands.pop_front();
        }
        self.commands.push_back(command.to_lowercase());
    }

    /// Whether `line` echoes a remembered command.
    #[must_use]
    pub fn contains(&self, line: &str) -> bool {
        let line = line.trim().to_lowercase();
        self.commands.iter().any(|command| *command == line)
    }

    /// Number of remembered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Whether `line` is probably a log line with its tag missing.
///
/// True when the line mentions a subsystem keyword or a millisecond value,
/// carries a strict `[hh:mm:ss]` timestamp, or is shorter than
/// [`MIN_RESPONSE_LENGTH`] without being a known echo.
#[must_use]
pub fn is_likely_corrupted_log(
    line: &str,
    vocabulary: &CompiledVocabulary,
    echoes: &EchoHistory,
) -> bool {
    if vocabulary
        .keywords
        .as_ref()
        .is_some_and(|keywords| keywords.is_match(line))
    {
        return true;
    }
    if millisecond_suffix().is_match(line) || strict_timestamp().is_match(line) {
        return true;
    }
    line.chars().count() < MIN_RESPONSE_LENGTH && !is_echo(line, vocabulary, echoes)
}

fn is_echo(line: &str, vocabulary: &CompiledVocabulary, echoes: &EchoHistory) -> bool {
    let lower = line.trim().to_lowercase();
    vocabulary
        .echo_exemptions
        .iter()
        .any(|word| lower.starts_with(word.as_str()))
        || echoes.contains(&lower)
}

/// Outcome of both classification passes for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Final stream.
    pub classification: Classification,
    /// Rule that fired in the first pass.
    pub rule: Rule,
    /// Whether the second pass moved the line to the log stream.
    pub demoted: bool,
}

impl Classifier {
    /// Classifies `line` and applies the corrupted-log second pass.
    ///
    /// Only fallback verdicts are re-examined; explicit prompt echoes stay
    /// in the command stream.
    #[must_use]
    pub fn classify_with_recovery(&self, line: &str, echoes: &EchoHistory) -> Verdict {
        let rule = self.matching_rule(line);
        let first = rule.verdict();
        let demoted = rule == Rule::Fallback
            && first == Classification::CommandResponse
            && is_likely_corrupted_log(line, self.vocabulary(), echoes);
        Verdict {
            classification: if demoted { Classification::Log } else { first },
            rule,
            demoted,
        }
    }
}
