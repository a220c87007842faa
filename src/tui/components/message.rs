use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::message::{MessageId, Role};
use crate::stream::{Body, SharedBody};

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
pub(super) const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
pub(super) const VERTICAL_OVERHEAD: u16 = 2;

/// Typing indicator frames for a reply that has not revealed anything yet.
const TYPING_FRAMES: [&str; 4] = ["·  ", "·· ", "···", " ··"];
/// Draw frames per typing indicator frame.
const TYPING_FRAME_TICKS: usize = 4;

/// One conversation bubble as the list keeps it.
///
/// The body is shared with the streaming task; everything else is owned by
/// the UI thread.
#[derive(Debug, Clone)]
pub struct Bubble {
    pub id: MessageId,
    pub role: Role,
    pub body: SharedBody,
    /// Shows the truncation badge.
    pub truncated: bool,
    /// Shows the "stopped" badge.
    pub cancelled: bool,
}

impl Bubble {
    pub fn new(id: MessageId, role: Role, body: SharedBody) -> Self {
        Self {
            id,
            role,
            body,
            truncated: false,
            cancelled: false,
        }
    }
}

/// A transient widget drawing one bubble from a body snapshot.
///
/// Created fresh each frame by `MessageList`, which owns the persistent
/// state (layout cache, scroll) and passes the badge text in as a prop.
pub struct MessageView<'a> {
    pub role: Role,
    pub body: &'a Body,
    /// Bottom-border badge, if any.
    pub badge: Option<&'a str>,
    pub frame_index: usize,
}

impl MessageView<'_> {
    /// Rows this bubble needs at `width`, borders included.
    ///
    /// Uses the same `Paragraph` the widget renders, so the prediction and
    /// the drawn height cannot drift apart.
    pub fn calculate_height(body: &Body, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let lines = match body {
            Body::Pending => 1,
            Body::Markup(markup) => {
                let rows = Paragraph::new(markup.text.clone())
                    .wrap(Wrap { trim: false })
                    .line_count(content_width);
                u16::try_from(rows).unwrap_or(u16::MAX).max(1)
            }
        };
        lines.saturating_add(VERTICAL_OVERHEAD)
    }
}

pub(super) fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Green),
        Role::Assistant => Style::default().fg(Color::Blue),
    }
}

impl Widget for MessageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = role_style(self.role);
        let border_style = style.add_modifier(Modifier::DIM);

        let mut block = Block::bordered()
            .title(self.role.label())
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        if let Some(badge) = self.badge {
            block = block.title_bottom(
                Line::from(Span::styled(
                    format!(" {badge} "),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::ITALIC),
                ))
                .right_aligned(),
            );
        }

        let inner = block.inner(area);
        block.render(area, buf);

        match self.body {
            Body::Pending => {
                let frame = TYPING_FRAMES[(self.frame_index / TYPING_FRAME_TICKS) % TYPING_FRAMES.len()];
                Paragraph::new(Span::styled(
                    frame,
                    Style::default().fg(Color::DarkGray),
                ))
                .render(inner, buf);
            }
            Body::Markup(markup) => {
                Paragraph::new(markup.text.clone())
                    .wrap(Wrap { trim: false })
                    .render(inner, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Markup;

    fn plain(text: &str) -> Body {
        Body::Markup(Markup::plain(text))
    }

    fn draw(view: MessageView<'_>, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn calculate_height_pending_is_one_line() {
        assert_eq!(
            MessageView::calculate_height(&Body::Pending, 80),
            1 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_zero_width_returns_minimum() {
        assert_eq!(MessageView::calculate_height(&plain("Hello"), 0), 1);
        assert_eq!(
            MessageView::calculate_height(&plain("Hello"), HORIZONTAL_OVERHEAD),
            1
        );
    }

    #[test]
    fn calculate_height_counts_hard_lines() {
        assert_eq!(
            MessageView::calculate_height(&plain("a\nb\nc"), 80),
            3 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_wraps_at_width_boundary() {
        // content width 5: "Hello" | "world"
        assert_eq!(
            MessageView::calculate_height(&plain("Hello world"), 9),
            2 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn render_shows_role_and_text() {
        let body = plain("Hi there");
        let screen = draw(
            MessageView {
                role: Role::Assistant,
                body: &body,
                badge: None,
                frame_index: 0,
            },
            30,
            3,
        );
        assert!(screen.contains("assistant"));
        assert!(screen.contains("Hi there"));
    }

    #[test]
    fn render_pending_shows_typing_indicator() {
        let screen = draw(
            MessageView {
                role: Role::Assistant,
                body: &Body::Pending,
                badge: None,
                frame_index: 8,
            },
            30,
            3,
        );
        assert!(screen.contains("···"));
    }

    #[test]
    fn render_badge_on_bottom_border() {
        let body = plain("partial");
        let screen = draw(
            MessageView {
                role: Role::Assistant,
                body: &body,
                badge: Some("answer truncated"),
                frame_index: 0,
            },
            40,
            3,
        );
        assert!(screen.contains("answer truncated"));
    }

    #[test]
    fn role_colors() {
        assert_eq!(role_style(Role::User).fg, Some(Color::Green));
        assert_eq!(role_style(Role::Assistant).fg, Some(Color::Blue));
    }
}
