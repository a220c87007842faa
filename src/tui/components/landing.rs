//! # Landing Page Component
//!
//! Empty state shown until the first message is sent. Once dismissed it is
//! never shown again in the session.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::component::Component;

pub struct LandingPage<'a> {
    pub endpoint: &'a str,
    /// Why chat is unavailable, if it is.
    pub disabled: Option<&'a str>,
}

impl<'a> LandingPage<'a> {
    pub fn new(endpoint: &'a str, disabled: Option<&'a str>) -> Self {
        Self { endpoint, disabled }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = vec![
            Line::from(Span::styled(
                "Ask me anything.",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("Parley v{}", env!("CARGO_PKG_VERSION")),
                dim,
            )),
            Line::from(Span::styled(self.endpoint, dim)),
            Line::default(),
        ];
        match self.disabled {
            Some(reason) => lines.push(Line::from(Span::styled(
                format!("Chat unavailable: {reason}"),
                Style::default().fg(Color::Red),
            ))),
            None => lines.push(Line::from(Span::styled(
                "[Enter] send · [Shift+Enter] newline · [Esc] cancel · [Ctrl+C] quit",
                dim,
            ))),
        }
        lines
    }
}

impl Component for LandingPage<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = self.lines();
        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        let [text_area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);

        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center),
            text_area,
        );
    }
}
