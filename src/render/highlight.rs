//! Syntax highlighting for code blocks already laid out by the formatter.

use std::sync::LazyLock;

use log::{debug, warn};
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::markup::{CodeBlock, Markup, expand_tabs};

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

pub struct Highlighter {
    theme: &'static Theme,
}

impl Highlighter {
    /// Uses the named syntect theme, or [`DEFAULT_THEME`] if it is unknown.
    /// Returns `None` only if the bundled theme set is empty.
    pub fn new(theme_name: &str) -> Option<Self> {
        let themes = &THEME_SET.themes;
        let theme = match themes.get(theme_name) {
            Some(t) => t,
            None => {
                warn!("Unknown highlight theme '{}', using {}", theme_name, DEFAULT_THEME);
                themes.get(DEFAULT_THEME)?
            }
        };
        Some(Self { theme })
    }

    /// Colours every code block not yet marked highlighted.
    pub fn highlight(&self, markup: &mut Markup) {
        let Markup { text, code_blocks } = markup;
        for block in code_blocks.iter_mut().filter(|b| !b.highlighted) {
            self.highlight_block(block, &mut text.lines);
            block.highlighted = true;
        }
    }

    fn highlight_block(&self, block: &CodeBlock, lines: &mut [ratatui::text::Line<'static>]) {
        let Some(syntax) = (!block.lang.is_empty())
            .then(|| SYNTAX_SET.find_syntax_by_token(&block.lang))
            .flatten()
        else {
            debug!("No syntax for code block lang '{}'", block.lang);
            return;
        };

        let mut hl = HighlightLines::new(syntax, self.theme);
        for (offset, source_line) in LinesWithEndings::from(&block.source).enumerate() {
            let index = block.lines.start + offset;
            if index >= block.lines.end {
                break;
            }
            let Some(line) = lines.get_mut(index) else {
                break;
            };
            let ranges = match hl.highlight_line(source_line, &SYNTAX_SET) {
                Ok(ranges) => ranges,
                Err(e) => {
                    // The parse state is unreliable after an error; the rest
                    // of the block keeps its plain text.
                    warn!("Highlight failed in '{}' block: {}", block.lang, e);
                    return;
                }
            };
            let spans = ranges.into_iter().filter_map(|(style, frag)| {
                let content = expand_tabs(frag.trim_end_matches(['\n', '\r']));
                if content.is_empty() {
                    return None;
                }
                let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
                Some(Span::styled(content, Style::default().fg(fg)))
            });
            line.spans.truncate(block.prefix_spans);
            line.spans.extend(spans);
        }
    }
}
