//! Text normalisation and width-aware wrapping.
//!
//! The bubble renderer has no access to font metrics while laying out, so
//! wrapping works on *width units*: a narrow glyph is one unit, a wide
//! (CJK/fullwidth) glyph is two.

use unicode_width::UnicodeWidthChar;

/// Marker appended to text that had to be cut short.
pub const ELLIPSIS: char = '…';

/// Normalise line endings to `\n` and trim surrounding whitespace.
///
/// Idempotent: `normalize_text(&normalize_text(x)) == normalize_text(x)`.
pub fn normalize_text(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Normalise and return `None` when nothing but whitespace remains.
pub fn non_empty_text(input: &str) -> Option<String> {
    let cleaned = normalize_text(input);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Normalise `input` and cap it at `max_chars` characters.
///
/// When the cap is exceeded the result is the first `max_chars - 1`
/// characters (at least one) followed by [`ELLIPSIS`].
pub fn clamp_text(input: &str, max_chars: usize) -> String {
    let normalized = normalize_text(input);
    if normalized.chars().count() <= max_chars {
        return normalized;
    }

    let keep = max_chars.saturating_sub(1).max(1);
    let mut clamped: String = normalized.chars().take(keep).collect();
    clamped.push(ELLIPSIS);
    clamped
}

/// Display width of a single character in width units (1 or 2).
///
/// East-Asian wide and fullwidth characters count as 2. Everything else,
/// including zero-width marks, counts as 1 so that every character advances
/// the line.
pub fn char_width(c: char) -> usize {
    c.width().unwrap_or(1).clamp(1, 2)
}

/// Total width of a string in width units.
pub fn text_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Output of [`wrap_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapped {
    /// Emitted lines, never empty (at least one possibly-empty line).
    pub lines: Vec<String>,
    /// Whether input remained after the line budget was exhausted.
    pub truncated: bool,
}

/// Wrap `input` into at most `max_lines` lines of at most `max_units` width units.
///
/// Paragraph breaks (`\n`) always start a new line and empty paragraphs are
/// kept as empty lines. Lines break at the character that would overflow the
/// budget; there is no word-boundary search because mixed CJK/Latin text has
/// no reliable word boundaries.
pub fn wrap_text(input: &str, max_units: usize, max_lines: usize) -> Wrapped {
    let normalized = normalize_text(input);
    let paragraphs: Vec<&str> = normalized.split('\n').collect();
    let mut lines: Vec<String> = Vec::new();
    let mut truncated = false;

    if max_lines == 0 {
        return Wrapped {
            lines: vec![String::new()],
            truncated: !normalized.is_empty(),
        };
    }

    'paragraphs: for (p_index, paragraph) in paragraphs.iter().enumerate() {
        let more_paragraphs = p_index + 1 < paragraphs.len();

        if paragraph.is_empty() {
            lines.push(String::new());
            if lines.len() >= max_lines {
                truncated = more_paragraphs;
                break;
            }
            continue;
        }

        let mut current = String::new();
        let mut units = 0;

        for c in paragraph.chars() {
            let w = char_width(c);
            if units + w > max_units && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                if lines.len() >= max_lines {
                    // The character that did not fit is still pending.
                    truncated = true;
                    break 'paragraphs;
                }
                units = 0;
            }
            current.push(c);
            units += w;
        }

        if !current.is_empty() {
            lines.push(current);
        }
        if lines.len() >= max_lines {
            truncated = more_paragraphs;
            break;
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines.truncate(max_lines);

    Wrapped { lines, truncated }
}

/// End the last line with a single [`ELLIPSIS`] when `truncated` is set.
///
/// An ellipsis already at the end of the line is replaced rather than
/// doubled, and trailing characters are dropped until the marker fits within
/// `max_units`.
pub fn ellipsize_last_line(mut lines: Vec<String>, truncated: bool, max_units: usize) -> Vec<String> {
    if !truncated {
        return lines;
    }
    let Some(last) = lines.last_mut() else {
        return lines;
    };

    let mut base = last.trim_end_matches(ELLIPSIS).to_string();
    let marker = char_width(ELLIPSIS);
    while !base.is_empty() && text_width(&base) + marker > max_units {
        base.pop();
    }
    base.push(ELLIPSIS);
    *last = base;

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== normalize_text Tests =====

    #[test]
    fn normalize_converts_crlf_and_cr_to_newline() {
        assert_eq!(normalize_text("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn normalize_trims_surrounding_whitespace() {
        assert_eq!(normalize_text("  \n hello world \t\n"), "hello world");
    }

    #[test]
    fn non_empty_text_rejects_whitespace_only() {
        assert_eq!(non_empty_text(" \r\n\t "), None);
        assert_eq!(non_empty_text(" hi "), Some("hi".to_string()));
    }

    // ===== clamp_text Tests =====

    #[test]
    fn clamp_keeps_short_text() {
        assert_eq!(clamp_text("short", 26), "short");
    }

    #[test]
    fn clamp_cuts_and_appends_ellipsis() {
        let clamped = clamp_text("abcdefghij", 5);
        assert_eq!(clamped, "abcd…");
        assert_eq!(clamped.chars().count(), 5, "Clamped text should be exactly max chars");
    }

    #[test]
    fn clamp_counts_characters_not_bytes() {
        assert_eq!(clamp_text("你好世界", 4), "你好世界");
        assert_eq!(clamp_text("你好世界啊", 4), "你好世…");
    }

    // ===== char_width Tests =====

    #[test]
    fn latin_is_one_unit_and_cjk_is_two() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('中'), 2);
        assert_eq!(char_width('ア'), 2);
        assert_eq!(char_width('한'), 2);
        assert_eq!(char_width('Ａ'), 2, "Fullwidth forms count as wide");
    }

    #[test]
    fn zero_width_characters_still_advance() {
        assert_eq!(char_width('\u{200b}'), 1);
        assert_eq!(char_width('\u{0301}'), 1);
    }

    // ===== wrap_text Tests =====

    #[test]
    fn wrap_breaks_at_unit_budget() {
        let wrapped = wrap_text("abcdefghijklmnop", 12, 5);
        assert_eq!(wrapped.lines, vec!["abcdefghijkl", "mnop"]);
        assert!(!wrapped.truncated);
    }

    #[test]
    fn wrap_counts_cjk_as_double_width() {
        let wrapped = wrap_text("一二三四五六七", 12, 5);
        assert_eq!(wrapped.lines, vec!["一二三四五六", "七"]);
    }

    #[test]
    fn wrap_mixed_script_does_not_split_wide_char_over_budget() {
        let wrapped = wrap_text("abcdefghijk中文", 12, 5);
        assert_eq!(
            wrapped.lines,
            vec!["abcdefghijk", "中文"],
            "A wide char that would exceed the budget moves to the next line"
        );
    }

    #[test]
    fn wrap_keeps_empty_paragraphs() {
        let wrapped = wrap_text("a\n\nb", 12, 5);
        assert_eq!(wrapped.lines, vec!["a", "", "b"]);
        assert!(!wrapped.truncated);
    }

    #[test]
    fn wrap_marks_truncation_when_characters_remain() {
        let wrapped = wrap_text(&"x".repeat(100), 12, 5);
        assert_eq!(wrapped.lines.len(), 5);
        assert!(wrapped.truncated);
    }

    #[test]
    fn wrap_marks_truncation_when_paragraphs_remain() {
        let wrapped = wrap_text("1\n2\n3\n4\n5\n6", 12, 5);
        assert_eq!(wrapped.lines, vec!["1", "2", "3", "4", "5"]);
        assert!(wrapped.truncated);
    }

    #[test]
    fn wrap_exact_fit_is_not_truncated() {
        let wrapped = wrap_text(&"x".repeat(60), 12, 5);
        assert_eq!(wrapped.lines.len(), 5);
        assert!(!wrapped.truncated, "Input consumed exactly should not be truncated");
    }

    #[test]
    fn wrap_empty_input_yields_single_empty_line() {
        let wrapped = wrap_text("   ", 12, 5);
        assert_eq!(wrapped.lines, vec![String::new()]);
        assert!(!wrapped.truncated);
    }

    #[test]
    fn wrap_snapshot_mixed_paragraphs() {
        let wrapped = wrap_text("Hello there, 世界!\r\nsecond line", 12, 5);
        insta::assert_snapshot!(wrapped.lines.join("|"), @"Hello there,| 世界!|second line");
    }

    // ===== ellipsize_last_line Tests =====

    #[test]
    fn ellipsize_is_noop_without_truncation() {
        let lines = vec!["abc".to_string()];
        assert_eq!(ellipsize_last_line(lines.clone(), false, 12), lines);
    }

    #[test]
    fn ellipsize_replaces_existing_marker() {
        let lines = vec!["first".to_string(), "second…".to_string()];
        let result = ellipsize_last_line(lines, true, 12);
        assert_eq!(result[1], "second…", "Ellipsis should not be doubled");
    }

    #[test]
    fn ellipsize_keeps_line_within_budget() {
        let lines = vec!["abcdefghijkl".to_string()];
        let result = ellipsize_last_line(lines, true, 12);
        assert_eq!(result[0], "abcdefghijk…");
        assert!(text_width(&result[0]) <= 12);
    }
}
