//! Cursor position and internal scroll for the InputBox.
//!
//! `CursorState` owns the cursor byte offset and the first visible line.
//! The text itself stays in `InputBox` and is passed in explicitly.

use ratatui::layout::Rect;

use super::text_wrap::{
    CONTENT_OFFSET_X, CONTENT_OFFSET_Y, MAX_VISIBLE_LINES, inner_width, locate, visual_lines,
};

pub(super) struct CursorState {
    /// Byte offset in the buffer (0..=buffer.len()), always on a char boundary
    pub pos: usize,
    /// First visible visual line (0 when content fits)
    pub scroll_offset: u16,
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            pos: 0,
            scroll_offset: 0,
        }
    }

    /// Reset cursor to start (used after Submit clears the buffer).
    pub fn reset(&mut self) {
        self.pos = 0;
        self.scroll_offset = 0;
    }

    /// Start of the logical line containing the cursor.
    pub fn line_start(&self, buffer: &str) -> usize {
        buffer[..self.pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    /// End of the logical line containing the cursor (before its `\n`).
    pub fn line_end(&self, buffer: &str) -> usize {
        buffer[self.pos..]
            .find('\n')
            .map(|i| self.pos + i)
            .unwrap_or(buffer.len())
    }

    /// Adjust `scroll_offset` so the cursor line is inside the viewport.
    pub fn update_scroll_offset(&mut self, buffer: &str, area_width: u16) {
        let lines = visual_lines(buffer, inner_width(area_width));
        let total = lines.len() as u16;
        if total <= MAX_VISIBLE_LINES {
            self.scroll_offset = 0;
            return;
        }

        let (row, _) = locate(buffer, &lines, self.pos);
        let row = row as u16;
        if row < self.scroll_offset {
            self.scroll_offset = row;
        } else if row >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = row + 1 - MAX_VISIBLE_LINES;
        }
        self.scroll_offset = self.scroll_offset.min(total - MAX_VISIBLE_LINES);
    }

    /// Screen (column, row) of the cursor inside `area`.
    pub fn screen_pos(&self, buffer: &str, area: Rect) -> (u16, u16) {
        let width = inner_width(area.width);
        let lines = visual_lines(buffer, width);
        let (row, col) = locate(buffer, &lines, self.pos);

        let visible_row = (row as u16).saturating_sub(self.scroll_offset);
        let col = (col as u16).min(width);
        (
            area.x + CONTENT_OFFSET_X + col,
            area.y + CONTENT_OFFSET_Y + visible_row,
        )
    }
}
