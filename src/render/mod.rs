//! Markdown + syntax-highlight pipeline producing display-ready [`Markup`].

pub mod highlight;
pub mod markdown;
pub mod markup;

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use ratatui::style::Color;

pub use highlight::Highlighter;
pub use markdown::{CommonMarkFormatter, MarkdownFormatter};
pub use markup::{CodeBlock, Markup};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The formatter panicked on this input.
    Panicked(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Panicked(reason) => write!(f, "markdown formatter panicked: {reason}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Which parts of the pipeline are switched on.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub markdown: bool,
    pub highlight: bool,
    pub theme: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            markdown: true,
            highlight: true,
            theme: highlight::DEFAULT_THEME.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Renderer {
    formatter: Option<Arc<dyn MarkdownFormatter>>,
    highlighter: Option<Arc<Highlighter>>,
}

impl Renderer {
    pub fn new(
        formatter: Option<Arc<dyn MarkdownFormatter>>,
        highlighter: Option<Highlighter>,
    ) -> Self {
        Self {
            formatter,
            highlighter: highlighter.map(Arc::new),
        }
    }

    pub fn from_settings(settings: &RenderSettings, base_fg: Color) -> Self {
        let formatter = settings
            .markdown
            .then(|| Arc::new(CommonMarkFormatter::new(base_fg)) as Arc<dyn MarkdownFormatter>);
        let highlighter = if settings.highlight {
            Highlighter::new(&settings.theme)
        } else {
            None
        };
        debug!(
            "Renderer: markdown={}, highlight={}",
            formatter.is_some(),
            highlighter.is_some()
        );
        Self::new(formatter, highlighter)
    }

    /// Neither markdown nor highlighting; every message shows literally.
    pub fn plain() -> Self {
        Self::new(None, None)
    }

    /// Markdown → markup. Never fails: without a formatter, or when it
    /// errors, the text is shown literally.
    pub fn render(&self, text: &str) -> Markup {
        match self.try_render(text) {
            Ok(markup) => markup,
            Err(e) => {
                warn!("Render failed, showing plain text: {}", e);
                Markup::plain(text)
            }
        }
    }

    /// Like [`render`](Self::render) but reports formatter failures.
    /// An absent formatter is not a failure: the result is plain markup.
    pub fn try_render(&self, text: &str) -> Result<Markup, RenderError> {
        match &self.formatter {
            Some(formatter) => formatter.format(text),
            None => Ok(Markup::plain(text)),
        }
    }

    /// Colours unhighlighted code blocks in place. No-op without a highlighter.
    pub fn highlight(&self, markup: &mut Markup) {
        if let Some(hl) = &self.highlighter {
            hl.highlight(markup);
        }
    }

    /// `render` followed by `highlight`: what a finished message looks like.
    pub fn display(&self, text: &str) -> Markup {
        let mut markup = self.render(text);
        self.highlight(&mut markup);
        markup
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::from_settings(&RenderSettings::default(), Color::Reset)
    }
}
