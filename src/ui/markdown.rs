//! Markdown to styled terminal lines, built on pulldown-cmark.
//!
//! Fenced and indented code becomes a [`RenderedBlock::Code`] so the render
//! pipeline can hand it to the highlighter; everything else is flattened into
//! text blocks. An unclosed fence (common mid-stream) is treated as code running
//! to the end of the text.

use crate::core::render::{CodeBlock, MarkdownRenderer, RenderedBlock, RenderedDocument};
use crate::ui::theme::Theme;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

const QUOTE_PREFIX: &str = "│ ";

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

fn language_hint_from_codeblock_kind(kind: &CodeBlockKind) -> Option<String> {
    match kind {
        CodeBlockKind::Indented => None,
        CodeBlockKind::Fenced(info) => info
            .split_ascii_whitespace()
            .next()
            .map(str::to_string)
            .filter(|s| !s.is_empty()),
    }
}

fn detab(s: &str) -> String {
    s.replace('\t', "    ")
}

/// Renders assistant markdown with the active theme.
#[derive(Debug, Clone)]
pub struct TerminalMarkdown {
    theme: Theme,
}

impl TerminalMarkdown {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl MarkdownRenderer for TerminalMarkdown {
    fn render(&self, text: &str) -> RenderedDocument {
        DocumentBuilder::new(&self.theme).build(text)
    }
}

struct DocumentBuilder<'a> {
    theme: &'a Theme,
    blocks: Vec<RenderedBlock>,
    lines: Vec<Line<'static>>,
    current_spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    quote_depth: usize,
    link_targets: Vec<String>,
    code: Option<(Option<String>, String)>,
    table_row: Vec<String>,
    table_cell: String,
    in_table_cell: bool,
}

impl<'a> DocumentBuilder<'a> {
    fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            blocks: Vec::new(),
            lines: Vec::new(),
            current_spans: Vec::new(),
            style_stack: vec![theme.assistant_text_style],
            list_stack: Vec::new(),
            quote_depth: 0,
            link_targets: Vec::new(),
            code: None,
            table_row: Vec::new(),
            table_cell: String::new(),
            in_table_cell: false,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let style = self.current_style().patch(patch);
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn line_prefix(&self) -> Vec<Span<'static>> {
        let mut prefix = Vec::new();
        if self.quote_depth > 0 {
            prefix.push(Span::styled(
                QUOTE_PREFIX.repeat(self.quote_depth),
                self.theme.md_quote_style,
            ));
        }
        prefix
    }

    fn push_text(&mut self, text: &str) {
        if self.in_table_cell {
            self.table_cell.push_str(text);
            return;
        }
        let style = self.current_style();
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                if self.current_spans.is_empty() {
                    self.current_spans = self.line_prefix();
                }
                self.current_spans
                    .push(Span::styled(part.to_string(), style));
            }
            if parts.peek().is_some() {
                self.flush_line();
            }
        }
    }

    fn flush_line(&mut self) {
        let spans = std::mem::take(&mut self.current_spans);
        self.lines.push(Line::from(spans));
    }

    fn flush_pending(&mut self) {
        if !self.current_spans.is_empty() {
            self.flush_line();
        }
    }

    /// Separate block-level elements with a single blank line.
    fn block_gap(&mut self) {
        self.flush_pending();
        let last_is_blank = self.lines.last().is_some_and(|l| l.width() == 0);
        let at_start = self.lines.is_empty() && self.blocks.is_empty();
        if !at_start && !last_is_blank && self.list_stack.is_empty() {
            self.lines.push(Line::default());
        }
    }

    fn flush_text_block(&mut self) {
        self.flush_pending();
        if !self.lines.is_empty() {
            self.blocks
                .push(RenderedBlock::Text(std::mem::take(&mut self.lines)));
        }
    }

    fn heading_style(&self, level: HeadingLevel) -> Style {
        match level {
            HeadingLevel::H1 => self
                .theme
                .md_heading_style
                .add_modifier(Modifier::UNDERLINED),
            _ => self.theme.md_heading_style,
        }
    }

    fn start_item(&mut self) {
        self.flush_pending();
        let depth = self.list_stack.len().saturating_sub(1);
        let marker = match self.list_stack.last_mut() {
            Some(ListKind::Ordered(n)) => {
                let cur = *n;
                *n += 1;
                format!("{cur}. ")
            }
            _ => "• ".to_string(),
        };
        self.current_spans = self.line_prefix();
        self.current_spans.push(Span::raw("  ".repeat(depth)));
        self.current_spans
            .push(Span::styled(marker, self.theme.md_list_marker_style));
    }

    fn finish_code_block(&mut self) {
        let Some((language, source)) = self.code.take() else {
            return;
        };
        self.flush_text_block();
        let source = source.strip_suffix('\n').unwrap_or(&source).to_string();
        let lines = source
            .split('\n')
            .map(|l| Line::from(Span::styled(detab(l), self.theme.md_code_block_style)))
            .collect();
        self.blocks.push(RenderedBlock::Code(CodeBlock::new(
            language, source, lines,
        )));
    }

    fn finish_table_row(&mut self) {
        let cells = std::mem::take(&mut self.table_row);
        let mut spans = self.line_prefix();
        for (i, cell) in cells.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", self.theme.md_quote_style));
            }
            spans.push(Span::styled(cell, self.current_style()));
        }
        self.lines.push(Line::from(spans));
    }

    fn build(mut self, text: &str) -> RenderedDocument {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(text, options) {
            if let Some((_, source)) = self.code.as_mut() {
                match event {
                    Event::Text(t) => {
                        source.push_str(&t);
                        continue;
                    }
                    Event::End(TagEnd::CodeBlock) => {
                        self.finish_code_block();
                        continue;
                    }
                    _ => continue,
                }
            }

            match event {
                Event::Start(tag) => match tag {
                    Tag::Paragraph => {
                        if self.list_stack.is_empty() {
                            self.block_gap();
                        }
                    }
                    Tag::Heading { level, .. } => {
                        self.block_gap();
                        let style = self.heading_style(level);
                        self.push_style(style);
                    }
                    Tag::BlockQuote(_) => {
                        self.block_gap();
                        self.quote_depth += 1;
                        self.push_style(self.theme.md_quote_style);
                    }
                    Tag::CodeBlock(kind) => {
                        self.block_gap();
                        self.code = Some((language_hint_from_codeblock_kind(&kind), String::new()));
                    }
                    Tag::List(start) => {
                        if self.list_stack.is_empty() {
                            self.block_gap();
                        }
                        self.list_stack.push(match start {
                            Some(n) => ListKind::Ordered(n),
                            None => ListKind::Unordered,
                        });
                    }
                    Tag::Item => self.start_item(),
                    Tag::Emphasis => self.push_style(self.theme.md_emphasis_style),
                    Tag::Strong => self.push_style(self.theme.md_strong_style),
                    Tag::Strikethrough => {
                        self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
                    }
                    Tag::Link { dest_url, .. } => {
                        self.link_targets.push(dest_url.to_string());
                        self.push_style(self.theme.md_link_style);
                    }
                    Tag::Table(_) => self.block_gap(),
                    Tag::TableCell => {
                        self.in_table_cell = true;
                        self.table_cell.clear();
                    }
                    Tag::TableHead => self.push_style(self.theme.md_strong_style),
                    _ => {}
                },
                Event::End(tag) => match tag {
                    TagEnd::Paragraph => self.flush_pending(),
                    TagEnd::Heading(_) => {
                        self.pop_style();
                        self.flush_pending();
                    }
                    TagEnd::BlockQuote(_) => {
                        self.flush_pending();
                        self.quote_depth = self.quote_depth.saturating_sub(1);
                        self.pop_style();
                    }
                    TagEnd::List(_) => {
                        self.flush_pending();
                        self.list_stack.pop();
                    }
                    TagEnd::Item => self.flush_pending(),
                    TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
                    TagEnd::Link => {
                        self.pop_style();
                        if let Some(url) = self.link_targets.pop() {
                            let shown = self
                                .current_spans
                                .last()
                                .is_some_and(|s| s.content.as_ref() == url);
                            if !shown && !url.is_empty() {
                                self.push_style(self.theme.md_quote_style);
                                self.push_text(&format!(" ({url})"));
                                self.pop_style();
                            }
                        }
                    }
                    TagEnd::TableCell => {
                        self.in_table_cell = false;
                        self.table_row.push(std::mem::take(&mut self.table_cell));
                    }
                    TagEnd::TableHead => {
                        self.finish_table_row();
                        self.pop_style();
                    }
                    TagEnd::TableRow => self.finish_table_row(),
                    _ => {}
                },
                Event::Text(t) => self.push_text(&t),
                Event::Code(code) => {
                    if self.in_table_cell {
                        self.table_cell.push_str(&code);
                    } else {
                        self.push_style(self.theme.md_inline_code_style);
                        self.push_text(&code);
                        self.pop_style();
                    }
                }
                Event::SoftBreak => self.push_text(" "),
                Event::HardBreak => self.flush_line(),
                Event::Rule => {
                    self.block_gap();
                    self.lines.push(Line::from(Span::styled(
                        "─".repeat(24),
                        self.theme.md_quote_style,
                    )));
                }
                Event::TaskListMarker(done) => {
                    self.push_text(if done { "[x] " } else { "[ ] " });
                }
                Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
                _ => {}
            }
        }

        // Fence still open when the text ran out.
        self.finish_code_block();
        self.flush_text_block();
        RenderedDocument {
            blocks: self.blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> RenderedDocument {
        TerminalMarkdown::new(Theme::dark_default()).render(text)
    }

    fn plain(document: &RenderedDocument) -> Vec<String> {
        document.lines().iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let doc = render("Hello **world**\n\nSecond line");
        assert_eq!(plain(&doc), vec!["Hello world", "", "Second line"]);
    }

    #[test]
    fn emphasis_applies_modifiers() {
        let doc = render("plain **bold** *it*");
        let lines = doc.lines();
        let bold = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "bold")
            .expect("bold span");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        let it = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "it")
            .expect("italic span");
        assert!(it.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn fenced_code_becomes_a_code_block() {
        let doc = render("Look:\n\n```rust\nfn main() {}\n```\n\nDone");
        let code: Vec<&CodeBlock> = doc.code_blocks().collect();
        assert_eq!(code.len(), 1);
        assert_eq!(code[0].language.as_deref(), Some("rust"));
        assert_eq!(code[0].source, "fn main() {}");
        assert!(!code[0].is_highlighted());
        assert_eq!(plain(&doc), vec!["Look:", "", "fn main() {}", "", "Done"]);
    }

    #[test]
    fn unclosed_fence_renders_as_code_to_the_end() {
        let doc = render("Intro\n\n```python\nprint(1)\nprint(2");
        let code: Vec<&CodeBlock> = doc.code_blocks().collect();
        assert_eq!(code.len(), 1);
        assert_eq!(code[0].source, "print(1)\nprint(2");
    }

    #[test]
    fn lists_get_markers_and_numbers() {
        let doc = render("- one\n- two\n\n3. three\n4. four");
        assert_eq!(
            plain(&doc),
            vec!["• one", "• two", "", "3. three", "4. four"]
        );
    }

    #[test]
    fn links_show_their_target() {
        let doc = render("see [docs](https://example.org)");
        assert_eq!(plain(&doc), vec!["see docs (https://example.org)"]);
        let autolink = render("<https://example.org>");
        assert_eq!(plain(&autolink), vec!["https://example.org"]);
    }

    #[test]
    fn quotes_are_prefixed() {
        let doc = render("> quoted\n> text");
        assert_eq!(plain(&doc), vec!["│ quoted text"]);
    }

    #[test]
    fn tables_render_one_line_per_row() {
        let doc = render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert_eq!(plain(&doc), vec!["a │ b", "1 │ 2"]);
    }

    #[test]
    fn empty_text_renders_nothing() {
        assert!(render("").is_empty());
    }
}
