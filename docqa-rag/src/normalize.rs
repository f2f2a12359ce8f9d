//! Text normalization applied before chunking.

/// Normalize raw document text.
///
/// - `\r\n` and bare `\r` become `\n`.
/// - Runs of spaces and tabs inside a line collapse to a single space,
///   and each line is trimmed.
/// - Runs of three or more newlines collapse to exactly two, so a single
///   blank line survives as a paragraph break.
/// - Leading and trailing whitespace is trimmed.
///
/// Total over any input; the empty string normalizes to itself.
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;
    for line in unified.split('\n') {
        let mut compact = String::with_capacity(line.len());
        for word in line.split_whitespace() {
            if !compact.is_empty() {
                compact.push(' ');
            }
            compact.push_str(word);
        }

        if compact.is_empty() {
            // Keep at most one blank line between paragraphs.
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }

        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&compact);
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t  "), "");
    }

    #[test]
    fn collapses_spaces_and_tabs() {
        assert_eq!(normalize("a   b\t\tc"), "a b c");
    }

    #[test]
    fn normalizes_windows_and_mac_line_endings() {
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc");
    }

    // Blank-line handling runs on intact lines; collapsing whitespace
    // across the whole string first would destroy every newline.
    #[test]
    fn preserves_paragraph_breaks() {
        assert_eq!(normalize("para one.\n\npara two."), "para one.\n\npara two.");
    }

    #[test]
    fn collapses_three_or_more_newlines_to_two() {
        assert_eq!(normalize("a\n\n\nb"), "a\n\nb");
        assert_eq!(normalize("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(normalize("  hello world  "), "hello world");
        assert_eq!(normalize("\n\nhello\n\n"), "hello");
    }

    #[test]
    fn strips_trailing_spaces_per_line() {
        assert_eq!(normalize("line one   \nline two"), "line one\nline two");
    }
}
