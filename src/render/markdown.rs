//! Markdown → [`Markup`] formatter.
//!
//! Thin wrapper around `pulldown_cmark` that converts markdown events into
//! styled `Line`/`Span` values. Headings, bold, italic, strikethrough, inline
//! code, code blocks, lists, task lists, tables, footnotes, blockquotes and
//! links. Code blocks are emitted uncoloured and indexed in
//! [`Markup::code_blocks`]; colouring is the highlighter's job.
//!
//! Formatting choices:
//! - single newlines inside a paragraph break the line (soft breaks are hard)
//! - GitHub-flavored extensions are on
//! - headings get no anchors or ids
//! - link targets and e-mail addresses are printed verbatim
//! - raw HTML is shown as literal text, never interpreted

use std::panic::{AssertUnwindSafe, catch_unwind};

use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd,
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use unicode_width::UnicodeWidthStr;

use super::RenderError;
use super::markup::{CodeBlock, Markup, expand_tabs};

/// Anything that can turn message text into [`Markup`].
pub trait MarkdownFormatter: Send + Sync {
    fn format(&self, content: &str) -> Result<Markup, RenderError>;
}

/// CommonMark + GFM formatter backed by `pulldown_cmark`.
pub struct CommonMarkFormatter {
    base_fg: Color,
}

impl CommonMarkFormatter {
    pub fn new(base_fg: Color) -> Self {
        Self { base_fg }
    }

    fn options() -> Options {
        let mut opts = Options::empty();
        opts.insert(Options::ENABLE_TABLES);
        opts.insert(Options::ENABLE_STRIKETHROUGH);
        opts.insert(Options::ENABLE_TASKLISTS);
        opts.insert(Options::ENABLE_FOOTNOTES);
        opts
    }

    fn format_events(&self, content: &str) -> Markup {
        let mut w = Writer::new(self.base_fg);
        for event in Parser::new_ext(content, Self::options()) {
            w.handle(event);
        }
        w.finish()
    }
}

impl MarkdownFormatter for CommonMarkFormatter {
    fn format(&self, content: &str) -> Result<Markup, RenderError> {
        catch_unwind(AssertUnwindSafe(|| self.format_events(content))).map_err(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            RenderError::Panicked(reason)
        })
    }
}

// ── Writer ──────────────────────────────────────────────────────────────────

/// Code block being collected; emitted on close.
struct CodeCapture {
    lang: String,
    source: String,
}

/// Table being collected; emitted on close.
#[derive(Default)]
struct TableCapture {
    rows: Vec<Vec<String>>,
    head_rows: usize,
    in_head: bool,
}

struct Writer {
    text: Text<'static>,
    code_blocks: Vec<CodeBlock>,
    base_fg: Color,
    /// Inline style stack (bold, italic, heading text, etc.). Styles compose
    /// via `patch` so nested bold+italic works.
    styles: Vec<Style>,
    /// Per-line prefix spans (blockquote `│`, code border).
    line_prefixes: Vec<Span<'static>>,
    /// List nesting: None = unordered, Some(n) = ordered at index n.
    list_indices: Vec<Option<u64>>,
    code: Option<CodeCapture>,
    table: Option<TableCapture>,
    /// Stored link URL, appended after the link text closes.
    link_url: Option<String>,
    /// Whether the next block element should be preceded by a blank line.
    needs_newline: bool,
}

impl Writer {
    fn new(base_fg: Color) -> Self {
        Self {
            text: Text::default(),
            code_blocks: vec![],
            base_fg,
            styles: vec![],
            line_prefixes: vec![],
            list_indices: vec![],
            code: None,
            table: None,
            link_url: None,
            needs_newline: false,
        }
    }

    fn finish(mut self) -> Markup {
        // An unterminated construct at end of input (mid-stream prefix) still
        // shows what was collected so far.
        if self.code.is_some() {
            self.close_code_block();
        }
        if self.table.is_some() {
            self.close_table();
        }
        Markup {
            text: self.text,
            code_blocks: self.code_blocks,
        }
    }

    // ── Style helpers ───────────────────────────────────────────────────

    fn style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    // ── Line/span helpers ───────────────────────────────────────────────

    fn push_line(&mut self, line: Line<'static>) {
        let mut out = line;
        for pfx in self.line_prefixes.iter().rev().cloned() {
            out.spans.insert(0, pfx);
        }
        self.text.lines.push(out);
    }

    fn push_span(&mut self, span: Span<'static>) {
        if let Some(line) = self.text.lines.last_mut() {
            line.push_span(span);
        } else {
            self.push_line(Line::from(vec![span]));
        }
    }

    fn blank_line_if_needed(&mut self) {
        if self.needs_newline {
            self.push_line(Line::default());
            self.needs_newline = false;
        }
    }

    // ── Event dispatch ──────────────────────────────────────────────────

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) => self.text(t),
            Event::Code(c) => self.inline_code(c),
            Event::Html(h) | Event::InlineHtml(h) => self.literal_html(h),
            Event::SoftBreak | Event::HardBreak => {
                if let Some(table) = self.table.as_mut() {
                    push_cell_text(table, " ");
                } else {
                    self.push_line(Line::default());
                }
            }
            Event::Rule => {
                self.blank_line_if_needed();
                self.push_line(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(Color::DarkGray),
                )));
                self.needs_newline = true;
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_span(Span::raw(marker));
            }
            Event::FootnoteReference(label) => {
                self.push_span(Span::styled(
                    format!("[^{label}]"),
                    Style::default().fg(Color::Cyan),
                ));
            }
            Event::InlineMath(m) | Event::DisplayMath(m) => self.inline_code(m),
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            // ── Block elements ──────────────────────────────────────────
            Tag::Paragraph => {
                self.blank_line_if_needed();
                self.push_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.blank_line_if_needed();
                let hs = heading_style(self.base_fg, level);
                let depth = heading_depth(level) as usize;
                self.push_line(Line::from(Span::styled(
                    format!("{} ", "#".repeat(depth)),
                    hs,
                )));
                self.push_style(hs);
            }
            Tag::BlockQuote(_) => {
                self.blank_line_if_needed();
                self.line_prefixes
                    .push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
                self.push_style(
                    Style::default()
                        .fg(self.base_fg)
                        .add_modifier(Modifier::DIM | Modifier::ITALIC),
                );
            }
            Tag::CodeBlock(kind) => {
                if !self.text.lines.is_empty() {
                    self.push_line(Line::default());
                }
                self.needs_newline = false;
                let lang = match &kind {
                    CodeBlockKind::Fenced(info) => info
                        .split(|c: char| c.is_whitespace() || c == ',')
                        .next()
                        .unwrap_or("")
                        .to_string(),
                    CodeBlockKind::Indented => String::new(),
                };

                let bs = Style::default().fg(Color::DarkGray);
                let top = if lang.is_empty() {
                    Line::from(Span::styled("╭──", bs))
                } else {
                    Line::from(vec![
                        Span::styled("╭── ", bs),
                        Span::styled(lang.clone(), bs.add_modifier(Modifier::BOLD)),
                        Span::styled(" ──", bs),
                    ])
                };
                self.push_line(top);
                self.line_prefixes.push(Span::styled("│ ", bs));
                self.code = Some(CodeCapture {
                    lang,
                    source: String::new(),
                });
            }
            Tag::List(start) => {
                if self.list_indices.is_empty() {
                    self.blank_line_if_needed();
                }
                self.list_indices.push(start);
            }
            Tag::Item => {
                self.needs_newline = false;
                self.push_line(Line::default());
                let depth = self.list_indices.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                if let Some(idx) = self.list_indices.last_mut() {
                    let marker = match idx {
                        None => format!("{indent}- "),
                        Some(n) => {
                            let s = format!("{indent}{n}. ");
                            *n += 1;
                            s
                        }
                    };
                    self.push_span(Span::styled(marker, Style::default().fg(Color::DarkGray)));
                }
            }
            Tag::Table(_) => {
                self.blank_line_if_needed();
                self.table = Some(TableCapture::default());
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                    table.rows.push(Vec::new());
                }
            }
            Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(Vec::new());
                }
            }
            Tag::TableCell => {
                if let Some(row) = self.table.as_mut().and_then(|t| t.rows.last_mut()) {
                    row.push(String::new());
                }
            }
            Tag::HtmlBlock => {
                self.blank_line_if_needed();
                self.push_line(Line::default());
            }
            Tag::FootnoteDefinition(label) => {
                self.blank_line_if_needed();
                self.push_line(Line::from(Span::styled(
                    format!("[^{label}]: "),
                    Style::default().fg(Color::Cyan),
                )));
            }

            // ── Inline elements ─────────────────────────────────────────
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link {
                link_type,
                dest_url,
                ..
            } => {
                // Autolinks already show their target as the link text.
                self.link_url = match link_type {
                    LinkType::Autolink | LinkType::Email => None,
                    _ => Some(dest_url.to_string()),
                };
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            Tag::Image { dest_url, .. } => {
                self.link_url = Some(dest_url.to_string());
                self.push_span(Span::styled("[image: ", Style::default().fg(Color::DarkGray)));
                self.push_style(Style::default().add_modifier(Modifier::ITALIC));
            }
            _ => {} // Definition lists, metadata blocks — skip
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.needs_newline = true,
            TagEnd::Heading(_) => {
                self.pop_style();
                self.needs_newline = true;
            }
            TagEnd::BlockQuote(_) => {
                self.line_prefixes.pop();
                self.pop_style();
                self.needs_newline = true;
            }
            TagEnd::CodeBlock => self.close_code_block(),
            TagEnd::List(_) => {
                self.list_indices.pop();
                self.needs_newline = true;
            }
            TagEnd::Item => {}
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = false;
                    table.head_rows = table.rows.len();
                }
            }
            TagEnd::Table => self.close_table(),
            TagEnd::HtmlBlock | TagEnd::FootnoteDefinition => self.needs_newline = true,
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_url.take() {
                    self.push_span(Span::raw(" ("));
                    self.push_span(Span::styled(
                        url,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::UNDERLINED),
                    ));
                    self.push_span(Span::raw(")"));
                }
            }
            TagEnd::Image => {
                self.pop_style();
                let url = self.link_url.take().unwrap_or_default();
                self.push_span(Span::styled(
                    format!("]({url})"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            _ => {}
        }
    }

    fn close_code_block(&mut self) {
        let Some(capture) = self.code.take() else {
            return;
        };
        let code_style = Style::default().fg(Color::White);
        let start = self.text.lines.len();
        let prefix_spans = self.line_prefixes.len();
        for line in capture.source.lines() {
            let content = expand_tabs(line.trim_end_matches('\r'));
            self.push_line(Line::from(Span::styled(content, code_style)));
        }
        let end = self.text.lines.len();
        self.code_blocks.push(CodeBlock {
            lang: capture.lang,
            lines: start..end,
            prefix_spans,
            source: capture.source,
            highlighted: false,
        });

        self.line_prefixes.pop(); // remove │ prefix before bottom border
        let bs = Style::default().fg(Color::DarkGray);
        self.push_line(Line::from(Span::styled("╰──", bs)));
        self.needs_newline = true;
    }

    fn close_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let sep = Style::default().fg(Color::DarkGray);
        for (r, row) in table.rows.iter().enumerate() {
            let is_head = r < table.head_rows;
            let cell_style = if is_head {
                self.style().add_modifier(Modifier::BOLD)
            } else {
                self.style()
            };
            let mut spans = Vec::with_capacity(columns * 2);
            for (i, width) in widths.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(" │ ", sep));
                }
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let pad = width.saturating_sub(cell.width());
                spans.push(Span::styled(format!("{cell}{}", " ".repeat(pad)), cell_style));
            }
            self.push_line(Line::from(spans));

            if is_head && r + 1 == table.head_rows {
                let rule = widths
                    .iter()
                    .map(|w| "─".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("─┼─");
                self.push_line(Line::from(Span::styled(rule, sep)));
            }
        }
        self.needs_newline = true;
    }

    // ── Content handlers ────────────────────────────────────────────────

    fn text(&mut self, cow: CowStr<'_>) {
        if let Some(code) = self.code.as_mut() {
            code.source.push_str(&cow);
            return;
        }
        if let Some(table) = self.table.as_mut() {
            push_cell_text(table, &cow);
            return;
        }

        let style = self.style();
        self.push_span(Span::styled(expand_tabs(&cow), style));
    }

    fn inline_code(&mut self, cow: CowStr<'_>) {
        if let Some(table) = self.table.as_mut() {
            push_cell_text(table, &cow);
            return;
        }
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        self.push_span(Span::styled(cow.to_string(), style));
    }

    fn literal_html(&mut self, cow: CowStr<'_>) {
        if let Some(code) = self.code.as_mut() {
            code.source.push_str(&cow);
            return;
        }
        let style = Style::default().fg(Color::DarkGray);
        let mut lines = cow.split('\n').peekable();
        while let Some(line) = lines.next() {
            if !line.is_empty() {
                self.push_span(Span::styled(expand_tabs(line), style));
            }
            if lines.peek().is_some_and(|next| !next.is_empty()) {
                self.push_line(Line::default());
            }
        }
    }
}

fn push_cell_text(table: &mut TableCapture, s: &str) {
    if let Some(cell) = table.rows.last_mut().and_then(|row| row.last_mut()) {
        cell.push_str(s);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn heading_style(base_fg: Color, level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => Style::default().fg(base_fg).add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
