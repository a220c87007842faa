//! # TitleBar Component
//!
//! Top status line: endpoint, turn status, and a "↓ New" marker when the
//! reply kept growing below a detached scroll position.
//!
//! Purely presentational. All props come from elsewhere:
//! - `endpoint`: core `App` (resolved profile)
//! - `status_message`: core `App` (set by the reducer)
//! - `outcome`: core `App::last_outcome`, only while no turn is in flight;
//!   colours the status
//! - `has_unseen_content`: TUI state (`MessageListState::unseen_below`)
//!
//! Layout priority, most to least complete:
//!
//! 1. `"Parley → http://host/api/ask | Receiving... | ↓ New"`
//! 2. `"Parley → http://host/api/ask | Receiving..."`
//! 3. `"Parley → http://host/api/ask"`

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::turn::TurnOutcome;
use crate::tui::component::Component;

pub struct TitleBar<'a> {
    pub endpoint: &'a str,
    pub status_message: &'a str,
    pub outcome: Option<&'a TurnOutcome>,
    pub has_unseen_content: bool,
}

impl<'a> TitleBar<'a> {
    pub fn new(endpoint: &'a str, status_message: &'a str, has_unseen_content: bool) -> Self {
        Self {
            endpoint,
            status_message,
            outcome: None,
            has_unseen_content,
        }
    }

    pub fn outcome(mut self, outcome: Option<&'a TurnOutcome>) -> Self {
        self.outcome = outcome;
        self
    }

    fn status_style(&self) -> Style {
        match self.outcome {
            Some(TurnOutcome::Failed { .. }) => Style::default().fg(Color::Red),
            Some(TurnOutcome::Answered { truncated: true }) => Style::default().fg(Color::Yellow),
            Some(TurnOutcome::Answered { .. }) => Style::default().fg(Color::Green),
            Some(TurnOutcome::Cancelled) => Style::default().fg(Color::DarkGray),
            None => Style::default(),
        }
    }

    fn line(&self) -> Line<'a> {
        let mut spans = vec![
            Span::styled("Parley", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" → "),
            Span::styled(self.endpoint, Style::default().fg(Color::DarkGray)),
        ];
        if !self.status_message.is_empty() {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(self.status_message, self.status_style()));
        }
        if self.has_unseen_content {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled("↓ New", Style::default().fg(Color::Yellow)));
        }
        Line::from(spans)
    }
}

impl Component for TitleBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(mut title_bar: TitleBar<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 1)).unwrap();
        terminal.draw(|f| title_bar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    /// Foreground colour of the first cell of `needle` on the drawn line.
    fn fg_of(mut title_bar: TitleBar<'_>, needle: &str) -> Option<Color> {
        let mut terminal = Terminal::new(TestBackend::new(80, 1)).unwrap();
        terminal.draw(|f| title_bar.render(f, f.area())).unwrap();
        let buffer = terminal.backend().buffer();
        let cells = buffer.content();
        let needle: Vec<String> = needle.chars().map(String::from).collect();
        cells
            .windows(needle.len())
            .find(|window| window.iter().zip(&needle).all(|(cell, ch)| cell.symbol() == ch.as_str()))
            .map(|window| window[0].fg)
    }

    #[test]
    fn test_title_bar_colours_status_by_outcome() {
        let failed = TurnOutcome::Failed {
            message: "rate limited".into(),
        };
        let bar = TitleBar::new("http://h/api/ask", "Request failed", false).outcome(Some(&failed));
        assert_eq!(fg_of(bar, "Request failed"), Some(Color::Red));

        let truncated = TurnOutcome::Answered { truncated: true };
        let bar = TitleBar::new("http://h/api/ask", "Done (truncated)", false)
            .outcome(Some(&truncated));
        assert_eq!(fg_of(bar, "Done (truncated)"), Some(Color::Yellow));

        let bar = TitleBar::new("http://h/api/ask", "Sending...", false);
        assert_eq!(fg_of(bar, "Sending..."), Some(Color::Reset));
    }

    #[test]
    fn test_title_bar_with_unseen_content() {
        let text = draw(TitleBar::new("http://localhost:8000/api/ask", "Receiving...", true));
        assert!(text.contains("Parley"));
        assert!(text.contains("localhost:8000/api/ask"));
        assert!(text.contains("Receiving..."));
        assert!(text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_with_status_message() {
        let text = draw(TitleBar::new("http://h/api/chat/ask", "Sending...", false));
        assert!(text.contains("Sending..."));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_default_no_status() {
        let text = draw(TitleBar::new("http://h/api/ask", "", false));
        assert!(text.contains("http://h/api/ask"));
        assert!(!text.contains('|'));
    }
}
