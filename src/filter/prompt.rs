//! Shell prompt removal.
//!
//! Runs on whole reassembled lines, since the generic prompt pattern is
//! anchored at line start. Accepts `\r\n`, `\r` or `\n` line breaks so
//! the `strip` subcommand can use it on raw text.

use crate::config::CompiledVocabulary;

/// Removes shell prompt idioms, then drops lines left empty.
///
/// # Examples
///
/// ```
/// use shell_sift::config::CompiledVocabulary;
/// use shell_sift::filter::strip_prompts;
///
/// let vocab = CompiledVocabulary::default();
/// assert_eq!(strip_prompts("uart:~$ version\r\n", &vocab), "version\r\n");
/// ```
#[must_use]
pub fn strip_prompts(text: &str, vocabulary: &CompiledVocabulary) -> String {
    let mut cleaned = text.to_string();
    for pattern in &vocabulary.prompt_patterns {
        if pattern.is_match(&cleaned) {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }
    }
    remove_empty_lines(&cleaned)
}

/// Drops whitespace-only lines.
fn remove_empty_lines(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for (content, terminator) in segments(text) {
        if !content.trim().is_empty() {
            output.push_str(content);
            output.push_str(terminator);
        }
    }
    output
}

/// Splits text into `(content, terminator)` pairs.
///
/// Terminators are `\r\n`, `\r` or `\n`; the last pair may have an empty
/// terminator.
fn segments(text: &str) -> Vec<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut result = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                result.push((&text[start..i], &text[i..i + 2]));
                i += 2;
                start = i;
            }
            b'\r' | b'\n' => {
                result.push((&text[start..i], &text[i..=i]));
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }

    if start < text.len() {
        result.push((&text[start..], ""));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("uart:~$ version\r\n", "version\r\n" ; "zephyr prompt with space")]
    #[test_case("uart:~$", "" ; "bare zephyr prompt")]
    #[test_case("board-1:~$ ls\n", "ls\n" ; "named prompt")]
    #[test_case("dev>status\n", "status\n" ; "device prompt")]
    #[test_case("login> admin\n", "admin\n" ; "login prompt")]
    #[test_case("root:$ reboot\n", "reboot\n" ; "generic prompt")]
    #[test_case("<inf> ready\r\nuart:~$ ", "<inf> ready\r\n" ; "trailing prompt")]
    #[test_case("one\n\n\ntwo\n", "one\ntwo\n" ; "empty lines removed")]
    #[test_case("<inf> x\nuart:~$ \n<inf> y\n", "<inf> x\n<inf> y\n" ; "prompt only line removed")]
    fn test_strip_prompts(input: &str, expected: &str) {
        let vocab = CompiledVocabulary::default();
        assert_eq!(strip_prompts(input, &vocab), expected);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let vocab = CompiledVocabulary::default();
        assert_eq!(strip_prompts("\r\nuart:~$ \r\nok\r\n", &vocab), "ok\r\n");
        assert_eq!(strip_prompts("\n", &vocab), "");
        assert_eq!(strip_prompts("   ", &vocab), "");
    }

    #[test]
    fn test_generic_prompt_only_at_line_start() {
        let vocab = CompiledVocabulary::default();
        assert_eq!(
            strip_prompts("<inf> main: hello\nmain: hi\n", &vocab),
            "<inf> main: hello\nhi\n"
        );
    }

    #[test]
    fn test_log_lines_untouched() {
        let vocab = CompiledVocabulary::default();
        let line = "[00:00:01.234,000] <inf> main: hello\r\n";
        assert_eq!(strip_prompts(line, &vocab), line);
    }

    #[test]
    fn test_segments() {
        assert_eq!(
            segments("a\r\nb\rc\nd"),
            vec![("a", "\r\n"), ("b", "\r"), ("c", "\n"), ("d", "")]
        );
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_custom_pattern_list() {
        let vocabulary = crate::config::Vocabulary {
            prompt_patterns: vec![r"mcu# ".to_string()],
            ..crate::config::Vocabulary::default()
        };
        let vocab = CompiledVocabulary::compile(&vocabulary).unwrap();
        assert_eq!(strip_prompts("mcu# reset\n", &vocab), "reset\n");
        // Default Zephyr prompt no longer recognised
        assert_eq!(strip_prompts("uart:~$ reset\n", &vocab), "uart:~$ reset\n");
    }
}
