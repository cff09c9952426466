//! Ordered classification rules.
//!
//! Each rule is a predicate paired with a verdict. Rules are evaluated top
//! to bottom and the first match wins, so the order of [`DEFAULT_RULES`]
//! is part of the behaviour.

use crate::config::CompiledVocabulary;
use crate::core::Classification;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// A single classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Empty or whitespace-only line.
    EmptyLine,
    /// Contains a log-level tag such as `<inf>`.
    LogLevelTag,
    /// Contains a bracketed timestamp or a truncated piece of one.
    BracketedTimestamp,
    /// Five characters or fewer including a fragment indicator.
    ShortFragmentIndicator,
    /// Exactly one character.
    SingleCharacter,
    /// Starts with the remnant of a split log tag.
    FragmentPrefix,
    /// Contains a shell prompt marker.
    PromptMarker,
    /// Two characters or fewer.
    VeryShort,
    /// Matches anything.
    Fallback,
}

/// Rule order used by [`Classifier::new`].
pub const DEFAULT_RULES: [Rule; 9] = [
    Rule::EmptyLine,
    Rule::LogLevelTag,
    Rule::BracketedTimestamp,
    Rule::ShortFragmentIndicator,
    Rule::SingleCharacter,
    Rule::FragmentPrefix,
    Rule::PromptMarker,
    Rule::VeryShort,
    Rule::Fallback,
];

/// Matches `[hh:mm:ss` and loose numeric fragments like `[01.431,67`.
pub(crate) fn loose_timestamp() -> &'static Regex {
    static LOOSE_TIMESTAMP: OnceLock<Regex> = OnceLock::new();
    LOOSE_TIMESTAMP.get_or_init(|| Regex::new(r"\[\d+[.,:]\d").expect("valid regex"))
}

impl Rule {
    /// Stable rule name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EmptyLine => "empty_line",
            Self::LogLevelTag => "log_level_tag",
            Self::BracketedTimestamp => "bracketed_timestamp",
            Self::ShortFragmentIndicator => "short_fragment_indicator",
            Self::SingleCharacter => "single_character",
            Self::FragmentPrefix => "fragment_prefix",
            Self::PromptMarker => "prompt_marker",
            Self::VeryShort => "very_short",
            Self::Fallback => "fallback",
        }
    }

    /// Verdict returned when this rule matches.
    #[must_use]
    pub const fn verdict(self) -> Classification {
        match self {
            Self::PromptMarker | Self::Fallback => Classification::CommandResponse,
            _ => Classification::Log,
        }
    }

    /// Tests the predicate against `line`.
    #[must_use]
    pub fn matches(self, line: &str, vocabulary: &CompiledVocabulary) -> bool {
        match self {
            Self::EmptyLine => line.trim().is_empty(),
            Self::LogLevelTag => {
                let lower = line.to_lowercase();
                vocabulary.log_tags.iter().any(|tag| lower.contains(tag))
            }
            Self::BracketedTimestamp => loose_timestamp().is_match(line),
            Self::ShortFragmentIndicator => {
                line.chars().count() <= 5
                    && line
                        .chars()
                        .any(|c| vocabulary.fragment_indicators.contains(&c))
            }
            Self::SingleCharacter => line.chars().count() == 1,
            Self::FragmentPrefix => vocabulary
                .fragment_prefixes
                .iter()
                .any(|prefix| line.starts_with(prefix.as_str())),
            Self::PromptMarker => vocabulary
                .prompt_markers
                .iter()
                .any(|marker| line.contains(marker.as_str())),
            Self::VeryShort => line.chars().count() <= 2,
            Self::Fallback => true,
        }
    }
}

/// Evaluates an ordered rule list over a vocabulary.
///
/// # Examples
///
/// ```
/// use shell_sift::classify::Classifier;
/// use shell_sift::core::Classification;
///
/// let classifier = Classifier::default();
/// assert_eq!(classifier.classify("<inf> boot done"), Classification::Log);
/// assert_eq!(classifier.classify("version"), Classification::CommandResponse);
/// assert_eq!(classifier.classify(""), Classification::Log);
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    vocabulary: CompiledVocabulary,
    rules: Vec<Rule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(CompiledVocabulary::default())
    }
}

impl Classifier {
    /// Creates a classifier with [`DEFAULT_RULES`].
    #[must_use]
    pub fn new(vocabulary: CompiledVocabulary) -> Self {
        Self::with_rules(vocabulary, DEFAULT_RULES.to_vec())
    }

    /// Creates a classifier with a custom rule order.
    ///
    /// A trailing [`Rule::Fallback`] is appended if missing so that every
    /// line receives a verdict.
    #[must_use]
    pub fn with_rules(vocabulary: CompiledVocabulary, mut rules: Vec<Rule>) -> Self {
        if rules.last() != Some(&Rule::Fallback) {
            rules.retain(|rule| *rule != Rule::Fallback);
            rules.push(Rule::Fallback);
        }
        Self { vocabulary, rules }
    }

    /// The vocabulary the rules consult.
    #[must_use]
    pub const fn vocabulary(&self) -> &CompiledVocabulary {
        &self.vocabulary
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the first rule matching `line`.
    #[must_use]
    pub fn matching_rule(&self, line: &str) -> Rule {
        self.rules
            .iter()
            .copied()
            .find(|rule| rule.matches(line, &self.vocabulary))
            .unwrap_or(Rule::Fallback)
    }

    /// Classifies `line`. Pure, total and deterministic.
    #[must_use]
    pub fn classify(&self, line: &str) -> Classification {
        self.matching_rule(line).verdict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", Rule::EmptyLine ; "empty")]
    #[test_case("   ", Rule::EmptyLine ; "whitespace")]
    #[test_case("<inf> boot done", Rule::LogLevelTag ; "inf tag")]
    #[test_case("main <WRN> low battery", Rule::LogLevelTag ; "uppercase tag")]
    #[test_case("<error> bus fault", Rule::LogLevelTag ; "long tag")]
    #[test_case("[12:03:44] MQTT publish ok", Rule::BracketedTimestamp ; "strict timestamp")]
    #[test_case("[01.431,67", Rule::BracketedTimestamp ; "truncated timestamp")]
    #[test_case("x [00:00:01.234,000] y", Rule::BracketedTimestamp ; "timestamp mid line")]
    #[test_case("nf>", Rule::ShortFragmentIndicator ; "tag remnant")]
    #[test_case("w", Rule::ShortFragmentIndicator ; "single indicator")]
    #[test_case("A", Rule::SingleCharacter ; "single char")]
    #[test_case("w reconnect scheduled", Rule::FragmentPrefix ; "w prefix")]
    #[test_case(": value out of range", Rule::FragmentPrefix ; "colon prefix")]
    #[test_case("login> admin access", Rule::PromptMarker ; "login marker")]
    #[test_case("uart:~$ kernel threads", Rule::PromptMarker ; "zephyr marker")]
    #[test_case("ok", Rule::VeryShort ; "two chars")]
    #[test_case("version", Rule::Fallback ; "plain response")]
    #[test_case("Zephyr version 3.5.0", Rule::Fallback ; "long response")]
    fn test_matching_rule(line: &str, expected: Rule) {
        let classifier = Classifier::default();
        assert_eq!(classifier.matching_rule(line), expected);
    }

    #[test_case("", Classification::Log)]
    #[test_case("<dbg> tick", Classification::Log)]
    #[test_case("[12:03:44] MQTT publish ok", Classification::Log)]
    #[test_case("uart:~$ help", Classification::CommandResponse)]
    #[test_case("version", Classification::CommandResponse)]
    #[test_case("ok", Classification::Log)]
    fn test_classify(line: &str, expected: Classification) {
        assert_eq!(Classifier::default().classify(line), expected);
    }

    #[test]
    fn test_rule_verdicts() {
        for rule in DEFAULT_RULES {
            let expected = if matches!(rule, Rule::PromptMarker | Rule::Fallback) {
                Classification::CommandResponse
            } else {
                Classification::Log
            };
            assert_eq!(rule.verdict(), expected, "{}", rule.name());
        }
    }

    #[test]
    fn test_first_match_wins() {
        // Tag and prompt marker both present: the tag rule comes first
        let classifier = Classifier::default();
        assert_eq!(
            classifier.matching_rule("uart:~$ <inf> echo"),
            Rule::LogLevelTag
        );
    }

    #[test]
    fn test_reordered_rules() {
        let classifier = Classifier::with_rules(
            CompiledVocabulary::default(),
            vec![Rule::PromptMarker, Rule::LogLevelTag],
        );
        assert_eq!(classifier.rules().last(), Some(&Rule::Fallback));
        assert_eq!(
            classifier.classify("uart:~$ <inf> echo"),
            Classification::CommandResponse
        );
    }

    #[test]
    fn test_fallback_moved_to_end() {
        let classifier = Classifier::with_rules(
            CompiledVocabulary::default(),
            vec![Rule::Fallback, Rule::EmptyLine],
        );
        assert_eq!(classifier.rules(), &[Rule::EmptyLine, Rule::Fallback]);
    }

    #[test]
    fn test_rule_names_unique() {
        let mut names: Vec<_> = DEFAULT_RULES.iter().map(|r| r.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_RULES.len());
    }
}
