//! Text filters.
//!
//! - **ansi**: control-sequence stripping down to printable ASCII, per chunk
//! - **prompt**: shell prompt removal, on reassembled text
//!
//! [`normalize_line_breaks`] runs after escape stripping, before the
//! terminator check.

pub mod ansi;
pub mod prompt;

pub use ansi::{STRIP_STEPS, StripStep, is_terminal_safe, split_incomplete_escape, strip};
pub use prompt::strip_prompts;

/// Converts `\r\n` and lone `\r` to `\n`.
///
/// # Examples
///
/// ```
/// use shell_sift::filter::normalize_line_breaks;
///
/// assert_eq!(normalize_line_breaks("a\r\nb\rc\n"), "a\nb\nc\n");
/// ```
#[must_use]
pub fn normalize_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
