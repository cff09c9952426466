//! Control-sequence stripping.
//!
//! Removes ANSI/VT escape sequences and the bare bracket remnants that
//! survive when the ESC byte is lost on the wire. Each step is a textual
//! removal; the broad ESC-prefixed pattern runs first so the looser
//! bracket patterns never eat part of a genuine escape sequence.
//!
//! Removing one sequence can join the text around it into another, as in
//! `[[1;33mm`, so [`strip`] repeats the steps until nothing changes.

use regex::Regex;
use std::sync::OnceLock;

/// Removal steps applied by [`strip`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripStep {
    /// `ESC [ params letter`.
    AnsiEscape,
    /// Back-to-back cursor-move + erase pairs, e.g. `[8D[J`.
    ControlPair,
    /// Colour and style codes without ESC, e.g. `[1;33m`.
    ColorCode,
    /// `ESC [ n A|B|C|D` cursor movement.
    CursorMove,
}

/// All pattern steps in application order.
pub const STRIP_STEPS: [StripStep; 4] = [
    StripStep::AnsiEscape,
    StripStep::ControlPair,
    StripStep::ColorCode,
    StripStep::CursorMove,
];

impl StripStep {
    /// Returns the compiled regex for this step.
    fn regex(self) -> &'static Regex {
        macro_rules! static_regex {
            ($name:ident, $pattern:expr) => {{
                static $name: OnceLock<Regex> = OnceLock::new();
                $name.get_or_init(|| Regex::new($pattern).expect("valid regex"))
            }};
        }

        match self {
            Self::AnsiEscape => static_regex!(ANSI_ESCAPE, r"\x1B\[[0-9;]*[a-zA-Z]"),
            Self::ControlPair => static_regex!(CONTROL_PAIR, r"\[[0-9]*[A-Z]\[[0-9]*[A-Z]"),
            Self::ColorCode => static_regex!(COLOR_CODE, r"\[[0-9;]*m"),
            Self::CursorMove => static_regex!(CURSOR_MOVE, r"\x1B\[[0-9]*[ABCD]"),
        }
    }

    /// Applies this step to `text`.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        self.regex().replace_all(text, "").into_owned()
    }

    /// Returns true if this step would remove anything from `text`.
    #[must_use]
    pub fn is_match(self, text: &str) -> bool {
        self.regex().is_match(text)
    }
}

/// Longest unterminated escape tail held back by [`split_incomplete_escape`].
pub const MAX_PENDING_ESCAPE: usize = 32;

/// Splits off an escape sequence cut short at the end of `text`.
///
/// Returns `(complete, pending)`. `pending` is empty unless `text` ends in
/// `ESC` or `ESC [ params` with no final letter; the caller prepends it to
/// the next read so the sequence is stripped whole.
#[must_use]
pub fn split_incomplete_escape(text: &str) -> (&str, &str) {
    static TRAILING_ESCAPE: OnceLock<Regex> = OnceLock::new();
    let re = TRAILING_ESCAPE
        .get_or_init(|| Regex::new(r"\x1B(?:\[[0-9;]*)?\z").expect("valid regex"));

    match re.find(text) {
        Some(m) if m.len() <= MAX_PENDING_ESCAPE => text.split_at(m.start()),
        _ => (text, ""),
    }
}

/// Returns true for characters that survive the final safety net.
#[must_use]
pub const fn is_terminal_safe(c: char) -> bool {
    matches!(c, '\n' | '\r' | ' '..='~')
}

/// Strips control sequences and every non-printable character.
///
/// The result contains only printable ASCII, `\n` and `\r`. Total and
/// infallible.
///
/// # Examples
///
/// ```
/// use shell_sift::filter::strip;
///
/// let raw = "\x1b[2K\x1b[1;33m<inf> boot done\x1b[0m\r\n";
/// assert_eq!(strip(raw), "<inf> boot done\r\n");
/// ```
#[must_use]
pub fn strip(text: &str) -> String {
    let mut cleaned = strip_pass(text);
    loop {
        let next = strip_pass(&cleaned);
        // Passes only remove characters
        if next.len() == cleaned.len() {
            return cleaned;
        }
        cleaned = next;
    }
}

fn strip_pass(text: &str) -> String {
    let mut cleaned = text.to_string();
    for step in STRIP_STEPS {
        cleaned = step.apply(&cleaned);
    }
    cleaned.retain(is_terminal_safe);
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("\x1b[2Khello", "hello" ; "erase line")]
    #[test_case("\x1b[1;33mwarn\x1b[0m", "warn" ; "color with escape")]
    #[test_case("[8D[Jprompt", "prompt" ; "bare control pair")]
    #[test_case("[1;32mgreen[0m", "green" ; "bare color code")]
    #[test_case("\x1b[3Dleft", "left" ; "cursor move")]
    #[test_case("tab\there", "tabhere" ; "tab dropped")]
    #[test_case("bell\x07", "bell" ; "bell dropped")]
    #[test_case("温度 25", " 25" ; "non ascii dropped")]
    #[test_case("line\r\n", "line\r\n" ; "line breaks kept")]
    #[test_case("[00:00:01.234,000] <inf> main", "[00:00:01.234,000] <inf> main" ; "timestamps survive")]
    #[test_case("[[1;33mm<inf> boot [00:01]", "<inf> boot [00:01]" ; "code joined by removal")]
    #[test_case("[1\x07;33mwarn", "warn" ; "code joined by dropped control")]
    fn test_strip(input: &str, expected: &str) {
        assert_eq!(strip(input), expected);
    }

    #[test]
    fn test_strip_scenario_boot_line() {
        let raw = "\x1b[2K\x1b[1;33m<inf> boot done\x1b[0m\r\n";
        assert_eq!(strip(raw), "<inf> boot done\r\n");
    }

    #[test]
    fn test_strip_lone_escape_dropped() {
        assert_eq!(strip("a\x1bb"), "ab");
    }

    #[test]
    fn test_step_order_is_broad_first() {
        assert_eq!(STRIP_STEPS[0], StripStep::AnsiEscape);
        // Stripping ESC-prefixed first leaves no stray '[' behind
        assert_eq!(StripStep::AnsiEscape.apply("\x1b[8D\x1b[J"), "");
    }

    #[test]
    fn test_strip_idempotent_on_clean_text() {
        let once = strip("\x1b[0m<wrn> low battery\x07\r\n");
        assert_eq!(strip(&once), once);
    }

    #[test]
    fn test_strip_leaves_no_step_match() {
        let once = strip("[[[1;33mm0mm [2;[1mK]x");
        assert_eq!(strip(&once), once);
        assert!(STRIP_STEPS.iter().all(|step| !step.is_match(&once)));
    }

    #[test_case("<inf> ok\x1b", "<inf> ok", "\x1b" ; "lone escape")]
    #[test_case("<inf> ok\x1b[1;3", "<inf> ok", "\x1b[1;3" ; "partial params")]
    #[test_case("<inf> ok\x1b[0m", "<inf> ok\x1b[0m", "" ; "complete sequence")]
    #[test_case("<inf> ok\x1b[0mtail", "<inf> ok\x1b[0mtail", "" ; "text after sequence")]
    #[test_case("plain", "plain", "" ; "no escape")]
    fn test_split_incomplete_escape(input: &str, complete: &str, pending: &str) {
        assert_eq!(split_incomplete_escape(input), (complete, pending));
    }

    #[test]
    fn test_split_incomplete_escape_bounded() {
        let runaway = format!("x\x1b[{}", "1".repeat(MAX_PENDING_ESCAPE));
        assert_eq!(split_incomplete_escape(&runaway), (runaway.as_str(), ""));
    }

    #[test]
    fn test_is_terminal_safe() {
        assert!(is_terminal_safe('a'));
        assert!(is_terminal_safe('~'));
        assert!(is_terminal_safe('\n'));
        assert!(!is_terminal_safe('\t'));
        assert!(!is_terminal_safe('\x7f'));
        assert!(!is_terminal_safe('é'));
    }
}
