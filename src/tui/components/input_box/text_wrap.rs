//! Hard-wrapping layout for the InputBox.
//!
//! Every visual line is a byte range into the buffer, so the renderer and
//! the cursor agree on where each character sits. Lines break at `\n` and
//! at the column limit; whitespace is never trimmed.

use std::ops::Range;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible content lines before internal scrolling kicks in
pub(super) const MAX_VISIBLE_LINES: u16 = 5;
/// Offset from the area's left edge to the first content column
pub(super) const CONTENT_OFFSET_X: u16 = 2;
/// Offset from the area's top edge to the first content row
pub(super) const CONTENT_OFFSET_Y: u16 = 1;

/// Content width left after borders and padding. 0 if the area is too narrow.
pub(super) fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Splits `text` into visual lines at most `width` columns wide.
/// Always returns at least one (possibly empty) line.
pub(super) fn visual_lines(text: &str, width: u16) -> Vec<Range<usize>> {
    let width = usize::from(width.max(1));
    let mut lines = Vec::new();
    let mut start = 0;
    let mut col = 0;
    for (i, c) in text.char_indices() {
        if c == '\n' {
            lines.push(start..i);
            start = i + 1;
            col = 0;
            continue;
        }
        let w = c.width().unwrap_or(0);
        if col + w > width && col > 0 {
            lines.push(start..i);
            start = i;
            col = 0;
        }
        col += w;
    }
    lines.push(start..text.len());
    lines
}

pub(super) fn line_count(text: &str, width: u16) -> u16 {
    u16::try_from(visual_lines(text, width).len()).unwrap_or(u16::MAX)
}

/// Visual (row, column) of byte offset `pos`.
///
/// At a soft wrap the cursor belongs to the start of the next line; at a
/// hard `\n` it stays at the end of the line it terminates.
pub(super) fn locate(text: &str, lines: &[Range<usize>], pos: usize) -> (usize, usize) {
    for (row, range) in lines.iter().enumerate() {
        let soft_wrapped = lines.get(row + 1).is_some_and(|next| next.start == range.end);
        let on_line = pos >= range.start
            && (pos < range.end || (pos == range.end && !soft_wrapped));
        if on_line {
            return (row, text[range.start..pos].width());
        }
    }
    let last = lines.len().saturating_sub(1);
    let col = lines.last().map(|r| text[r.clone()].width()).unwrap_or(0);
    (last, col)
}

/// Byte offset of the character boundary before `pos`.
pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .chars()
        .next_back()
        .map(|c| pos - c.len_utf8())
        .unwrap_or(0)
}

/// Byte offset of the character boundary after `pos`.
pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered<'a>(text: &'a str, width: u16) -> Vec<&'a str> {
        visual_lines(text, width).into_iter().map(|r| &text[r]).collect()
    }

    #[test]
    fn empty_text_is_one_line() {
        assert_eq!(rendered("", 10), vec![""]);
        assert_eq!(line_count("", 10), 1);
    }

    #[test]
    fn hard_breaks_split_lines() {
        assert_eq!(rendered("ab\ncd\n", 10), vec!["ab", "cd", ""]);
    }

    #[test]
    fn long_lines_break_at_width_keeping_spaces() {
        assert_eq!(rendered("hello world", 5), vec!["hello", " worl", "d"]);
    }

    #[test]
    fn wide_chars_count_two_columns() {
        assert_eq!(rendered("日本語", 4), vec!["日本", "語"]);
    }

    #[test]
    fn cursor_after_soft_wrap_moves_to_next_line() {
        let text = "abcdef";
        let lines = visual_lines(text, 3);
        assert_eq!(locate(text, &lines, 3), (1, 0));
        assert_eq!(locate(text, &lines, 6), (1, 3));
    }

    #[test]
    fn cursor_before_newline_stays_on_line() {
        let text = "ab\ncd";
        let lines = visual_lines(text, 10);
        assert_eq!(locate(text, &lines, 2), (0, 2));
        assert_eq!(locate(text, &lines, 3), (1, 0));
    }

    #[test]
    fn cursor_after_trailing_newline_on_empty_line() {
        let text = "ab\n";
        let lines = visual_lines(text, 10);
        assert_eq!(locate(text, &lines, 3), (1, 0));
    }

    #[test]
    fn char_boundaries_respect_utf8() {
        let text = "aé🌍";
        assert_eq!(next_char_boundary(text, 0), 1);
        assert_eq!(next_char_boundary(text, 1), 3);
        assert_eq!(prev_char_boundary(text, 7), 3);
        assert_eq!(prev_char_boundary(text, 0), 0);
        assert_eq!(next_char_boundary(text, 7), 7);
    }
}
