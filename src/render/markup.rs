use std::ops::Range;

use ratatui::text::{Line, Text};

/// Display-ready content for one message body.
///
/// `text` is what gets drawn. `code_blocks` indexes the fenced/indented code
/// inside it so the highlight pass can recolour those lines later.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Markup {
    pub text: Text<'static>,
    pub code_blocks: Vec<CodeBlock>,
}

/// A code block inside a [`Markup`].
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Info-string language token (`rust`, `py`, ...). Empty if none.
    pub lang: String,
    /// Indices into `Markup::text.lines`, one line per source line.
    pub lines: Range<usize>,
    /// Number of leading decoration spans (borders, quote bars) on each line.
    pub prefix_spans: usize,
    /// The raw code, exactly as parsed.
    pub source: String,
    /// Set once the highlight pass has processed this block.
    pub highlighted: bool,
}

impl Markup {
    /// Literal rendering: every line shown as-is, nothing interpreted.
    pub fn plain(content: &str) -> Self {
        let lines = content
            .split('\n')
            .map(|line| Line::raw(expand_tabs(line.trim_end_matches('\r'))))
            .collect::<Vec<_>>();
        Self {
            text: Text::from(lines),
            code_blocks: Vec::new(),
        }
    }

    /// The visible characters, one `\n` between lines. Styles are dropped.
    pub fn to_plain_string(&self) -> String {
        self.text
            .lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn line_count(&self) -> usize {
        self.text.lines.len()
    }

    pub fn is_fully_highlighted(&self) -> bool {
        self.code_blocks.iter().all(|b| b.highlighted)
    }
}

/// ratatui renders `\t` as zero-width, so tabs become four spaces.
pub(crate) fn expand_tabs(s: &str) -> String {
    if s.contains('\t') {
        s.replace('\t', "    ")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keeps_markdown_literal() {
        let markup = Markup::plain("**bold** <b>tag</b>");
        assert_eq!(markup.to_plain_string(), "**bold** <b>tag</b>");
        assert!(markup.text.lines[0].spans.iter().all(|s| s.style == Default::default()));
    }

    #[test]
    fn plain_preserves_blank_lines() {
        let markup = Markup::plain("a\n\nb");
        assert_eq!(markup.line_count(), 3);
        assert_eq!(markup.to_plain_string(), "a\n\nb");
    }

    #[test]
    fn plain_expands_tabs() {
        let markup = Markup::plain("\tx");
        assert_eq!(markup.to_plain_string(), "    x");
    }
}
