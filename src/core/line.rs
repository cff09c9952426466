//! Logical lines and fragments.
//!
//! A logical line is born when the reconstructor extracts it from the
//! accumulation buffer, is classified once, dispatched, and never mutated.

use serde::{Deserialize, Serialize};

/// How a logical line came to be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LineOrigin {
    /// Delimited by an observed line terminator.
    Terminated,
    /// Emitted by a flush deadline without a terminator.
    Forced,
    /// Split out of an oversized line.
    Fragment {
        /// Position among the fragments of the parent line (0-based).
        index: usize,
    },
}

/// A trimmed, newline-free unit of text ready for classification.
///
/// # Examples
///
/// ```
/// use shell_sift::core::{LineOrigin, LogicalLine};
///
/// let line = LogicalLine::new("  <inf> ready ", LineOrigin::Terminated).unwrap();
/// assert_eq!(line.text(), "<inf> ready");
/// assert!(LogicalLine::new("   ", LineOrigin::Forced).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalLine {
    text: String,
    origin: LineOrigin,
}

impl LogicalLine {
    /// Creates a line from raw text, trimming surrounding whitespace.
    ///
    /// Returns `None` when nothing remains after trimming.
    #[must_use]
    pub fn new(text: &str, origin: LineOrigin) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            text: trimmed.to_string(),
            origin,
        })
    }

    /// Creates the `index`th fragment of an oversized line.
    #[must_use]
    pub fn fragment(text: &str, index: usize) -> Option<Self> {
        Self::new(text, LineOrigin::Fragment { index })
    }

    /// Line content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How the line was extracted.
    #[must_use]
    pub const fn origin(&self) -> LineOrigin {
        self.origin
    }

    /// Length in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether this line is a fragment of a longer one.
    #[must_use]
    pub const fn is_fragment(&self) -> bool {
        matches!(self.origin, LineOrigin::Fragment { .. })
    }

    /// Consumes the line, returning its text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

impl AsRef<str> for LogicalLine {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
