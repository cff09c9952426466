//! Character boundary helpers.
//!
//! The accumulation buffer and the fragment splitter measure lengths in
//! characters but slice by byte offset; these helpers convert between the
//! two without ever cutting a multi-byte character.

/// Byte offset at which the last `count` characters of `s` begin.
///
/// Returns 0 when `s` holds `count` characters or fewer.
#[must_use]
pub fn tail_start(s: &str, count: usize) -> usize {
    if count == 0 {
        return s.len();
    }
    s.char_indices()
        .rev()
        .nth(count - 1)
        .map_or(0, |(offset, _)| offset)
}

/// Splits `s` into consecutive pieces of at most `max_chars` characters.
///
/// A `max_chars` of zero yields the whole string as one piece.
#[must_use]
pub fn split_at_char_limit(s: &str, max_chars: usize) -> Vec<&str> {
    if max_chars == 0 || s.is_empty() {
        return vec![s];
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in s.char_indices() {
        if count == max_chars {
            pieces.push(&s[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    pieces.push(&s[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_start() {
        assert_eq!(tail_start("abcdef", 2), 4);
        assert_eq!(tail_start("abcdef", 6), 0);
        assert_eq!(tail_start("abcdef", 10), 0);
        assert_eq!(tail_start("abcdef", 0), 6);
        // "世界!" keeps whole characters
        let s = "ab世界!";
        assert_eq!(&s[tail_start(s, 2)..], "界!");
    }

    #[test]
    fn test_split_at_char_limit() {
        assert_eq!(split_at_char_limit("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(split_at_char_limit("abc", 3), vec!["abc"]);
        assert_eq!(split_at_char_limit("", 3), vec![""]);
        assert_eq!(split_at_char_limit("abc", 0), vec!["abc"]);
        assert_eq!(split_at_char_limit("世界世界", 3), vec!["世界世", "界"]);
    }
}
