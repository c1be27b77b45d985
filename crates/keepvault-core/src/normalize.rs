//! Content normalization
//!
//! Canonicalizes note text so that line endings, blank lines, trailing
//! whitespace and `#` escaping never register as content changes.
//!
//! The vault escapes a `#` that begins a word as `\#` so that note text is not
//! read as a heading or tag by markdown editors. Normalization removes that
//! escape on both sides before comparing.

use keepvault_fs::checksum;

/// Marker character escaped in the vault format.
const MARKER: char = '#';

/// Convert CRLF and lone CR line endings to LF.
pub fn unify_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Canonical form of `text` for equality testing.
///
/// Steps: unify line endings, drop blank lines, right-trim each line, rejoin,
/// unescape markers, strip the whole block. Idempotent.
pub fn normalize(text: &str) -> String {
    let unified = unify_line_endings(text);
    let joined = unified
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    unescape_markers(&joined).trim().to_string()
}

/// Short digest of the normalized text.
pub fn content_digest(text: &str) -> String {
    checksum::short_digest(&normalize(text))
}

/// Escape `#` at the start of a word as `\#`.
///
/// Only a marker followed by a character that is neither whitespace nor
/// another marker is escaped, so headings and `##` runs are left alone.
pub fn escape_markers(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        if c == MARKER {
            let word_start = i == 0 || chars[i - 1].is_whitespace();
            let followed = chars
                .get(i + 1)
                .is_some_and(|n| !n.is_whitespace() && *n != MARKER);
            if word_start && followed {
                out.push('\\');
            }
        }
        out.push(c);
    }
    out
}

/// Turn `\#x` back into `#x`.
///
/// A backslash that is itself escaped (`\\#`) is kept, which makes the
/// operation idempotent.
pub fn unescape_markers(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        if c == '\\' {
            let escaped_backslash = i > 0 && chars[i - 1] == '\\';
            let marker_next = chars.get(i + 1) == Some(&MARKER);
            let word_after = chars
                .get(i + 2)
                .is_some_and(|n| !n.is_whitespace() && *n != MARKER);
            if !escaped_backslash && marker_next && word_after {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Collapse all internal whitespace (including newlines) to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical label name: underscores become spaces, lowercase.
pub fn normalize_label(label: &str) -> String {
    collapse_whitespace(&label.replace('_', " ")).to_lowercase()
}

/// Label name as written to frontmatter tags.
pub fn label_to_tag(label: &str) -> String {
    label.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn normalize_drops_blank_lines_and_trailing_space() {
        let input = "\r\n  milk  \r\n\r\n\teggs\t\r\n   \n";
        assert_eq!(normalize(input), "milk\n\teggs");
    }

    #[test]
    fn normalize_unescapes_markers() {
        assert_eq!(normalize("buy \\#milk\n\\#eggs"), "buy #milk\n#eggs");
    }

    #[rstest]
    #[case("#tag", "\\#tag")]
    #[case("a #tag b", "a \\#tag b")]
    #[case("line\n#tag", "line\n\\#tag")]
    #[case("# Heading", "# Heading")]
    #[case("## Sub", "## Sub")]
    #[case("issue#42", "issue#42")]
    #[case("already \\#esc", "already \\#esc")]
    #[case("#", "#")]
    fn escape_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_markers(input), expected);
    }

    #[rstest]
    #[case("\\#tag", "#tag")]
    #[case("\\\\#tag", "\\\\#tag")]
    #[case("\\# spaced", "\\# spaced")]
    #[case("plain", "plain")]
    fn unescape_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(unescape_markers(input), expected);
    }

    #[test]
    fn collapse_whitespace_joins_lines() {
        assert_eq!(collapse_whitespace("  My\n\tNote   Title "), "My Note Title");
    }

    #[test]
    fn labels_normalize_symmetrically() {
        assert_eq!(normalize_label("To_Do"), "to do");
        assert_eq!(normalize_label("to do"), "to do");
        assert_eq!(label_to_tag("to do"), "to_do");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(text in "[ a-z#\\\\\t\r\n]{0,64}") {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn normalize_is_idempotent_for_any_text(text in any::<String>()) {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn escaping_is_invisible_after_normalization(text in "[ a-z#\\\\\n]{0,64}") {
            prop_assert_eq!(normalize(&escape_markers(&text)), normalize(&text));
        }
    }
}
