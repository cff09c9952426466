//! Bounded accumulation buffer.
//!
//! Holds stripped, normalized text that has not yet been split into lines.
//! When an append pushes the buffer past its capacity, only the most recent
//! `retain` characters are kept.

use crate::io::tail_start;

/// Text awaiting a line terminator, with a hard character cap.
///
/// # Examples
///
/// ```
/// use shell_sift::reconstruct::AccumulationBuffer;
///
/// let mut buffer = AccumulationBuffer::new(8, 4);
/// assert_eq!(buffer.push_str("abcdef"), 0);
/// assert_eq!(buffer.push_str("ghi"), 5);
/// assert_eq!(buffer.as_str(), "fghi");
/// ```
#[derive(Debug, Clone)]
pub struct AccumulationBuffer {
    text: String,
    chars: usize,
    max_chars: usize,
    retain_chars: usize,
}

impl AccumulationBuffer {
    /// Creates an empty buffer.
    ///
    /// `retain_chars` is clamped to `max_chars`.
    #[must_use]
    pub fn new(max_chars: usize, retain_chars: usize) -> Self {
        Self {
            text: String::new(),
            chars: 0,
            max_chars,
            retain_chars: retain_chars.min(max_chars),
        }
    }

    /// Appends `text`, truncating if the cap is exceeded.
    ///
    /// Returns the number of characters discarded from the front.
    pub fn push_str(&mut self, text: &str) -> usize {
        self.text.push_str(text);
        self.chars += text.chars().count();
        if self.chars <= self.max_chars {
            return 0;
        }
        let start = tail_start(&self.text, self.retain_chars);
        let dropped = self.chars - self.retain_chars.min(self.chars);
        self.text.drain(..start);
        self.chars -= dropped;
        dropped
    }

    /// Whether the buffered text ends in `\n`.
    #[must_use]
    pub fn ends_with_newline(&self) -> bool {
        self.text.ends_with('\n')
    }

    /// Removes and returns the buffered text.
    pub fn take(&mut self) -> String {
        self.chars = 0;
        std::mem::take(&mut self.text)
    }

    /// Buffered text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.chars
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.chars == 0
    }

    /// Character cap.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_chars
    }
}
