//! Incremental rendering of an in-flight assistant reply.
//!
//! Every delta re-renders the whole accumulated text instead of patching the
//! previous output: a code fence or emphasis opened early may only close in a
//! later delta, so only a full re-parse is correct. Each delta costs O(total
//! length); `benches/render_pipeline.rs` measures it.

use ratatui::{
    style::Style,
    text::{Line, Span},
};

/// Marker appended to the last rendered line while a reply is still streaming.
pub const GENERATING_MARKER: &str = "▌";

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub source: String,
    pub lines: Vec<Line<'static>>,
    highlighted: bool,
}

impl CodeBlock {
    pub fn new(language: Option<String>, source: String, lines: Vec<Line<'static>>) -> Self {
        Self {
            language,
            source,
            lines,
            highlighted: false,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Replace the plain lines with highlighted ones and mark the block so it is
    /// never processed again.
    pub fn mark_highlighted(&mut self, lines: Vec<Line<'static>>) {
        self.lines = lines;
        self.highlighted = true;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedBlock {
    Text(Vec<Line<'static>>),
    Code(CodeBlock),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedDocument {
    pub blocks: Vec<RenderedBlock>,
}

impl RenderedDocument {
    pub fn code_blocks(&self) -> impl Iterator<Item = &CodeBlock> {
        self.blocks.iter().filter_map(|block| match block {
            RenderedBlock::Code(code) => Some(code),
            RenderedBlock::Text(_) => None,
        })
    }

    pub fn code_blocks_mut(&mut self) -> impl Iterator<Item = &mut CodeBlock> {
        self.blocks.iter_mut().filter_map(|block| match block {
            RenderedBlock::Code(code) => Some(code),
            RenderedBlock::Text(_) => None,
        })
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                RenderedBlock::Text(lines) => out.extend(lines.iter().cloned()),
                RenderedBlock::Code(code) => out.extend(code.lines.iter().cloned()),
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Converts markdown source into styled terminal lines.
pub trait MarkdownRenderer {
    fn render(&self, text: &str) -> RenderedDocument;
}

/// Applies syntax highlighting to a rendered code block. Implementations must
/// call [`CodeBlock::mark_highlighted`], even when no grammar matched.
pub trait CodeHighlighter {
    fn highlight(&self, block: &mut CodeBlock);
}

/// Markdown rendering followed by a single highlighting pass.
pub struct RenderPipeline {
    markdown: Box<dyn MarkdownRenderer + Send>,
    highlighter: Option<Box<dyn CodeHighlighter + Send>>,
}

impl RenderPipeline {
    pub fn new(
        markdown: Box<dyn MarkdownRenderer + Send>,
        highlighter: Option<Box<dyn CodeHighlighter + Send>>,
    ) -> Self {
        Self {
            markdown,
            highlighter,
        }
    }

    pub fn render(&self, text: &str) -> RenderedDocument {
        let mut document = self.markdown.render(text);
        if let Some(highlighter) = &self.highlighter {
            for block in document.code_blocks_mut() {
                if !block.is_highlighted() {
                    highlighter.highlight(block);
                }
            }
        }
        document
    }
}

#[derive(Debug, Default)]
pub struct IncrementalRenderer {
    accumulated: String,
    generating: bool,
    document: RenderedDocument,
    renders: usize,
}

impl IncrementalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new reply and show the generating marker.
    pub fn begin(&mut self) {
        self.accumulated.clear();
        self.document = RenderedDocument::default();
        self.renders = 0;
        self.generating = true;
    }

    pub fn push_delta(&mut self, delta: &str, pipeline: &RenderPipeline) {
        self.accumulated.push_str(delta);
        self.rerender(pipeline);
    }

    /// Drop the marker and render once more, even when no delta arrived.
    pub fn finish(&mut self, pipeline: &RenderPipeline) {
        self.generating = false;
        self.rerender(pipeline);
    }

    /// Re-render the accumulated text, e.g. after a theme change.
    pub fn refresh(&mut self, pipeline: &RenderPipeline) {
        self.rerender(pipeline);
    }

    fn rerender(&mut self, pipeline: &RenderPipeline) {
        self.document = pipeline.render(&self.accumulated);
        self.renders += 1;
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn document(&self) -> &RenderedDocument {
        &self.document
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn view_lines(&self, marker_style: Style) -> Vec<Line<'static>> {
        let mut lines = self.document.lines();
        if self.generating {
            let marker = Span::styled(GENERATING_MARKER, marker_style);
            match lines.last_mut() {
                Some(last) => last.spans.push(marker),
                None => lines.push(Line::from(marker)),
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Plain renderer: fenced blocks become code blocks, everything else text.
    struct FenceSplitter;

    impl MarkdownRenderer for FenceSplitter {
        fn render(&self, text: &str) -> RenderedDocument {
            let mut blocks = Vec::new();
            for (i, part) in text.split("```").enumerate() {
                if part.is_empty() {
                    continue;
                }
                let lines: Vec<Line<'static>> =
                    part.lines().map(|l| Line::from(l.to_string())).collect();
                if i % 2 == 1 {
                    blocks.push(RenderedBlock::Code(CodeBlock::new(
                        None,
                        part.to_string(),
                        lines,
                    )));
                } else {
                    blocks.push(RenderedBlock::Text(lines));
                }
            }
            RenderedDocument { blocks }
        }
    }

    struct CountingHighlighter {
        calls: Arc<AtomicUsize>,
    }

    impl CodeHighlighter for CountingHighlighter {
        fn highlight(&self, block: &mut CodeBlock) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lines = block.lines.clone();
            block.mark_highlighted(lines);
        }
    }

    fn pipeline() -> (RenderPipeline, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = RenderPipeline::new(
            Box::new(FenceSplitter),
            Some(Box::new(CountingHighlighter {
                calls: calls.clone(),
            })),
        );
        (pipeline, calls)
    }

    fn flatten(lines: &[Line<'static>]) -> String {
        lines
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn every_delta_rerenders_the_whole_text() {
        let (pipeline, _) = pipeline();
        let mut renderer = IncrementalRenderer::new();
        renderer.begin();
        renderer.push_delta("Hel", &pipeline);
        renderer.push_delta("lo", &pipeline);

        assert_eq!(renderer.render_count(), 2);
        assert_eq!(renderer.accumulated(), "Hello");
        assert_eq!(flatten(&renderer.document().lines()), "Hello");
    }

    #[test]
    fn marker_is_shown_only_while_generating() {
        let (pipeline, _) = pipeline();
        let mut renderer = IncrementalRenderer::new();
        renderer.begin();
        renderer.push_delta("Hi", &pipeline);
        assert!(flatten(&renderer.view_lines(Style::default())).ends_with(GENERATING_MARKER));

        renderer.finish(&pipeline);
        let view = flatten(&renderer.view_lines(Style::default()));
        assert!(!view.contains(GENERATING_MARKER));
        assert_eq!(view, "Hi");
    }

    #[test]
    fn empty_reply_still_renders_on_finish() {
        let (pipeline, _) = pipeline();
        let mut renderer = IncrementalRenderer::new();
        renderer.begin();
        assert_eq!(
            flatten(&renderer.view_lines(Style::default())),
            GENERATING_MARKER
        );

        renderer.finish(&pipeline);
        assert_eq!(renderer.render_count(), 1);
        assert!(renderer.view_lines(Style::default()).is_empty());
    }

    #[test]
    fn each_rendered_code_block_is_highlighted_once() {
        let (pipeline, calls) = pipeline();
        let mut renderer = IncrementalRenderer::new();
        renderer.begin();
        renderer.push_delta("intro ```let x", &pipeline);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        renderer.push_delta(" = 1;``` outro", &pipeline);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(renderer
            .document()
            .code_blocks()
            .all(CodeBlock::is_highlighted));
    }

    #[test]
    fn already_highlighted_blocks_are_skipped() {
        struct PreHighlighted;
        impl MarkdownRenderer for PreHighlighted {
            fn render(&self, text: &str) -> RenderedDocument {
                let mut block = CodeBlock::new(None, text.to_string(), Vec::new());
                block.mark_highlighted(vec![Line::from(text.to_string())]);
                RenderedDocument {
                    blocks: vec![RenderedBlock::Code(block)],
                }
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = RenderPipeline::new(
            Box::new(PreHighlighted),
            Some(Box::new(CountingHighlighter {
                calls: calls.clone(),
            })),
        );
        let document = pipeline.render("fn main() {}");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(flatten(&document.lines()), "fn main() {}");
    }
}
