//! Raw chunk decoding.
//!
//! Serial chunks arrive at arbitrary byte boundaries and may carry line
//! noise, so decoding walks a fallback chain instead of failing.

use serde::Serialize;

/// Text decodings tried in order for each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDecoding {
    /// Strict UTF-8.
    Utf8,
    /// One byte per character (ISO-8859-1).
    Latin1,
    /// Platform default; replaces invalid sequences with U+FFFD.
    LocaleDefault,
}

/// Fallback order applied by [`decode_chunk`].
pub const DECODING_CHAIN: [TextDecoding; 3] = [
    TextDecoding::Utf8,
    TextDecoding::Latin1,
    TextDecoding::LocaleDefault,
];

impl TextDecoding {
    /// Decodes `bytes`, returning `None` if this decoding rejects them.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes).ok().map(ToString::to_string),
            Self::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::LocaleDefault => Some(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// Decodes a raw chunk, falling back through [`DECODING_CHAIN`].
///
/// Returns the decoded text and the decoding that produced it, or `None`
/// when the input is empty or every decoding yields nothing.
///
/// # Examples
///
/// ```
/// use shell_sift::io::decode::{TextDecoding, decode_chunk};
///
/// let (text, used) = decode_chunk(b"uart:~$ ").unwrap();
/// assert_eq!(text, "uart:~$ ");
/// assert_eq!(used, TextDecoding::Utf8);
///
/// let (_, used) = decode_chunk(&[0x41, 0xff, 0x42]).unwrap();
/// assert_eq!(used, TextDecoding::Latin1);
/// ```
#[must_use]
pub fn decode_chunk(bytes: &[u8]) -> Option<(String, TextDecoding)> {
    if bytes.is_empty() {
        return None;
    }
    DECODING_CHAIN.iter().find_map(|&decoding| {
        decoding
            .decode(bytes)
            .filter(|text| !text.is_empty())
            .map(|text| (text, decoding))
    })
}
