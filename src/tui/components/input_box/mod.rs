//! # InputBox Component
//!
//! Multi-line message editor.
//!
//! ## Responsibilities
//!
//! - Capture text input (typing, paste, newline via Shift+Enter / Ctrl+J)
//! - Handle editing (backspace, delete, cursor movement)
//! - Handle submission (Enter)
//! - Grow with its content up to `MAX_VISIBLE_LINES`, then scroll internally
//!
//! ## State Management
//!
//! The buffer is internal state. `disabled` is a prop from the application
//! state: while a turn is in flight (or chat is unavailable) the box ignores
//! all input and hides the cursor.

mod cursor;
mod text_wrap;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use cursor::CursorState;
use text_wrap::{
    MAX_VISIBLE_LINES, VERTICAL_OVERHEAD, inner_width, line_count, next_char_boundary,
    prev_char_boundary, visual_lines,
};

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted the text (Enter pressed)
    Submit(String),
    /// Buffer content changed; `empty` if it is now blank
    Changed { empty: bool },
    /// Only the cursor moved
    CursorMoved,
}

/// Why the box is not accepting input.
#[derive(Debug, Clone, PartialEq)]
pub enum Disabled {
    /// A turn is in flight.
    Busy,
    /// Chat cannot be used at all.
    Unavailable,
}

/// Text input component.
///
/// # Props
///
/// - `disabled`: set while the UI lock is held or chat is unavailable
///
/// # State
///
/// - `buffer`: Current text being typed
/// - `cursor`: Cursor position and internal scroll (see `CursorState`)
pub struct InputBox {
    pub buffer: String,
    pub disabled: Option<Disabled>,
    cursor: CursorState,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            disabled: None,
            cursor: CursorState::new(),
        }
    }

    /// Height for the current buffer, clamped to
    /// [1 + VERTICAL_OVERHEAD, MAX_VISIBLE_LINES + VERTICAL_OVERHEAD].
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let lines = line_count(&self.buffer, inner_width(area_width));
        lines.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    /// Scroll the box so the cursor line is visible again.
    pub fn reveal_cursor(&mut self, area_width: u16) {
        self.cursor.update_scroll_offset(&self.buffer, area_width);
    }

    fn insert(&mut self, text: &str) -> InputEvent {
        self.buffer.insert_str(self.cursor.pos, text);
        self.cursor.pos += text.len();
        self.changed()
    }

    fn changed(&self) -> InputEvent {
        InputEvent::Changed {
            empty: self.buffer.trim().is_empty(),
        }
    }

    fn move_to(&mut self, pos: usize) -> Option<InputEvent> {
        (pos != self.cursor.pos).then(|| {
            self.cursor.pos = pos;
            InputEvent::CursorMoved
        })
    }

    fn title(&self) -> &'static str {
        match self.disabled {
            None => " Message · [Enter] send · [Shift+Enter] newline ",
            Some(Disabled::Busy) => " Waiting for answer · [Esc] cancel ",
            Some(Disabled::Unavailable) => " Chat unavailable ",
        }
    }

    fn render_scrollbar(&self, frame: &mut Frame, area: Rect, total_lines: u16) {
        if total_lines <= MAX_VISIBLE_LINES {
            return;
        }
        let max_scroll = total_lines - MAX_VISIBLE_LINES;
        let mut state = ScrollbarState::default()
            .content_length(usize::from(max_scroll))
            .position(usize::from(self.cursor.scroll_offset));
        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 1,
            width: 1,
            height: area.height.saturating_sub(2),
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            scrollbar_area,
            &mut state,
        );
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.cursor.update_scroll_offset(&self.buffer, area.width);

        let lines = visual_lines(&self.buffer, inner_width(area.width));
        let total_lines = lines.len() as u16;
        let start = usize::from(self.cursor.scroll_offset);
        let visible: Vec<Line> = lines
            .iter()
            .skip(start)
            .take(usize::from(MAX_VISIBLE_LINES))
            .map(|r| Line::raw(&self.buffer[r.clone()]))
            .collect();

        let (text_style, border_style) = if self.disabled.is_some() {
            (
                Style::default().fg(Color::DarkGray),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
            )
        } else {
            (Style::default().fg(Color::Green), Style::default().fg(Color::Green))
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(self.title())
            .padding(Padding::horizontal(1));

        frame.render_widget(
            Paragraph::new(Text::from(visible)).block(block).style(text_style),
            area,
        );
        self.render_scrollbar(frame, area, total_lines);

        if self.disabled.is_none() {
            frame.set_cursor_position(self.cursor.screen_pos(&self.buffer, area));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if self.disabled.is_some() {
            return None;
        }
        match event {
            TuiEvent::InputChar(c) => {
                let mut utf8 = [0u8; 4];
                Some(self.insert(c.encode_utf8(&mut utf8)))
            }
            TuiEvent::Newline => Some(self.insert("\n")),
            TuiEvent::Paste(text) => {
                let text = text.replace("\r\n", "\n").replace('\r', "\n");
                Some(self.insert(&text))
            }
            TuiEvent::Backspace => {
                if self.cursor.pos == 0 {
                    return None;
                }
                let prev = prev_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(prev..self.cursor.pos);
                self.cursor.pos = prev;
                Some(self.changed())
            }
            TuiEvent::Delete => {
                if self.cursor.pos >= self.buffer.len() {
                    return None;
                }
                let next = next_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(self.cursor.pos..next);
                Some(self.changed())
            }
            TuiEvent::CursorLeft => self.move_to(prev_char_boundary(&self.buffer, self.cursor.pos)),
            TuiEvent::CursorRight => self.move_to(next_char_boundary(&self.buffer, self.cursor.pos)),
            TuiEvent::CursorHome => self.move_to(self.cursor.line_start(&self.buffer)),
            TuiEvent::CursorEnd => self.move_to(self.cursor.line_end(&self.buffer)),
            TuiEvent::Submit => {
                if self.buffer.trim().is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.cursor.reset();
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}
