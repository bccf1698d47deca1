use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use unicode_width::UnicodeWidthStr;

use super::wrap::{WrapOptions, wrap_styled_spans};
use crate::style::{Style, StyledLine, StyledSpan};

/// Renders markdown text into styled lines wrapped at the given width.
///
/// Streaming-safe: truncated markup (an unclosed fence or emphasis)
/// still renders, it just carries the open style to the end.
pub fn render_markdown(text: &str, width: usize) -> Vec<StyledLine> {
    if text.is_empty() {
        return vec![StyledLine::empty()];
    }

    let parser = Parser::new_ext(text, Options::empty());
    let mut renderer = MarkdownRenderer::new(width);
    for event in parser {
        renderer.process_event(event);
    }
    renderer.finish()
}

struct MarkdownRenderer {
    width: usize,
    lines: Vec<StyledLine>,
    /// Spans of the block currently being collected.
    current_spans: Vec<StyledSpan>,
    /// Style stack for nested inline styles.
    style_stack: Vec<Style>,
    in_code_block: bool,
    code_block_lang: Option<String>,
    list_stack: Vec<ListState>,
}

#[derive(Debug, Clone)]
struct ListState {
    /// None for unordered, Some(n) for ordered starting at n.
    ordered: Option<u64>,
    current_item: u64,
}

impl MarkdownRenderer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current_spans: Vec::new(),
            style_stack: vec![Style::Assistant],
            in_code_block: false,
            code_block_lang: None,
            list_stack: Vec::new(),
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or(Style::Assistant)
    }

    fn push_style(&mut self, style: Style) {
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(&tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => self.current_spans.push(StyledSpan::new(
                code.to_string(),
                Style::CodeInline,
            )),
            Event::SoftBreak => self
                .current_spans
                .push(StyledSpan::new(" ", self.current_style())),
            Event::HardBreak => self
                .current_spans
                .push(StyledSpan::new("\n", self.current_style())),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.current_spans
                    .push(StyledSpan::new(marker, Style::ListBullet));
            }
            Event::Rule => {
                self.flush_paragraph();
                self.lines.push(StyledLine::from_span(StyledSpan::plain(
                    "─".repeat(self.width.min(40)),
                )));
            }
            // HTML is skipped to avoid terminal injection.
            Event::Html(_) | Event::InlineHtml(_) => {}
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
    }

    fn start_tag(&mut self, tag: &Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                let style = match level {
                    HeadingLevel::H1 => Style::H1,
                    HeadingLevel::H2 => Style::H2,
                    _ => Style::H3,
                };
                self.push_style(style);
            }
            Tag::CodeBlock(kind) => {
                self.flush_paragraph();
                self.in_code_block = true;
                self.code_block_lang = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.push_style(Style::CodeBlock);
            }
            Tag::List(start) => {
                self.flush_paragraph();
                self.list_stack.push(ListState {
                    ordered: *start,
                    current_item: start.unwrap_or(1),
                });
            }
            Tag::Item => self.flush_paragraph(),
            Tag::BlockQuote(_) => {
                self.flush_paragraph();
                self.push_style(Style::BlockQuote);
            }
            Tag::Emphasis => self.push_style(Style::Emphasis),
            Tag::Strong => self.push_style(Style::Strong),
            Tag::Link { .. } => self.push_style(Style::Link),
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_paragraph();
                if self.list_stack.is_empty() {
                    self.lines.push(StyledLine::empty());
                }
            }
            TagEnd::Heading(_) => {
                self.flush_paragraph();
                self.pop_style();
                self.lines.push(StyledLine::empty());
            }
            TagEnd::CodeBlock => {
                self.flush_code_block();
                self.in_code_block = false;
                self.pop_style();
                self.lines.push(StyledLine::empty());
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.lines.push(StyledLine::empty());
                }
            }
            TagEnd::Item => {
                self.flush_list_item();
                if let Some(list) = self.list_stack.last_mut() {
                    list.current_item += 1;
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush_paragraph();
                self.pop_style();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Link => self.pop_style(),
            _ => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.current_spans
            .push(StyledSpan::new(text, self.current_style()));
    }

    fn flush_paragraph(&mut self) {
        if self.current_spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current_spans);
        let opts = WrapOptions::new(self.width);
        self.lines.extend(wrap_styled_spans(&spans, &opts));
    }

    /// Code blocks render verbatim between subtle fences, unwrapped.
    fn flush_code_block(&mut self) {
        if self.current_spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current_spans);
        let full_text: String = spans.iter().map(|s| s.text.as_str()).collect();

        let fence = match &self.code_block_lang {
            Some(lang) => format!("```{lang}"),
            None => "```".to_string(),
        };
        self.lines
            .push(StyledLine::from_span(StyledSpan::new(fence, Style::CodeFence)));

        for line in full_text.trim_end_matches('\n').split('\n') {
            self.lines.push(StyledLine {
                spans: vec![
                    StyledSpan::plain("  "),
                    StyledSpan::new(line, Style::CodeBlock),
                ],
            });
        }

        self.lines
            .push(StyledLine::from_span(StyledSpan::new("```", Style::CodeFence)));
        self.code_block_lang = None;
    }

    fn flush_list_item(&mut self) {
        if self.current_spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current_spans);

        let (marker, marker_style) = match self.list_stack.last() {
            Some(list) if list.ordered.is_some() => {
                (format!("{}. ", list.current_item), Style::ListNumber)
            }
            _ => ("• ".to_string(), Style::ListBullet),
        };

        let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
        let marker_width = marker.width();
        let opts = WrapOptions {
            width: self.width,
            first_prefix: vec![
                StyledSpan::plain(indent.clone()),
                StyledSpan::new(marker, marker_style),
            ],
            rest_prefix: vec![StyledSpan::plain(format!(
                "{indent}{}",
                " ".repeat(marker_width)
            ))],
        };
        self.lines.extend(wrap_styled_spans(&spans, &opts));
    }

    fn finish(mut self) -> Vec<StyledLine> {
        if !self.current_spans.is_empty() {
            if self.in_code_block {
                self.flush_code_block();
            } else {
                self.flush_paragraph();
            }
        }
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        if self.lines.is_empty() {
            self.lines.push(StyledLine::empty());
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_style(lines: &[StyledLine], style: Style) -> bool {
        lines.iter().any(|l| l.spans.iter().any(|s| s.style == style))
    }

    #[test]
    fn inline_code_is_styled() {
        let lines = render_markdown("Use `code` here", 80);
        assert!(has_style(&lines, Style::CodeInline));
    }

    #[test]
    fn bold_and_italic_are_styled() {
        let lines = render_markdown("**bold** and *italic*", 80);
        assert!(has_style(&lines, Style::Strong));
        assert!(has_style(&lines, Style::Emphasis));
    }

    #[test]
    fn heading_levels_map_to_styles() {
        let lines = render_markdown("# H1\n\n## H2\n\n### H3", 80);
        assert!(has_style(&lines, Style::H1));
        assert!(has_style(&lines, Style::H2));
        assert!(has_style(&lines, Style::H3));
    }

    #[test]
    fn code_block_preserves_indentation() {
        let md = "```\nfn main() {\n    println!(\"hi\");\n}\n```";
        let lines = render_markdown(md, 20);
        let code_lines: Vec<_> = lines
            .iter()
            .filter(|l| l.spans.iter().any(|s| s.style == Style::CodeBlock))
            .collect();
        assert!(!code_lines.is_empty());
        assert!(
            code_lines
                .iter()
                .any(|l| l.spans.iter().any(|s| s.text.contains("    ")))
        );
    }

    #[test]
    fn lists_get_markers() {
        let lines = render_markdown("- item 1\n- item 2", 80);
        assert!(has_style(&lines, Style::ListBullet));
        let lines = render_markdown("1. first\n2. second", 80);
        assert!(has_style(&lines, Style::ListNumber));
    }

    #[test]
    fn plain_text_uses_assistant_style() {
        let lines = render_markdown("just plain text", 80);
        assert!(has_style(&lines, Style::Assistant));
    }

    #[test]
    fn empty_input_yields_one_empty_line() {
        assert_eq!(render_markdown("", 80).len(), 1);
    }

    #[test]
    fn unclosed_fence_still_renders() {
        // A streaming delta can end mid code block.
        let lines = render_markdown("before\n\n```rust\nlet x = 1;", 80);
        assert!(has_style(&lines, Style::CodeBlock));
        let combined: String = lines.iter().map(StyledLine::text).collect::<Vec<_>>().join("\n");
        assert!(combined.contains("let x = 1;"));
    }

    #[test]
    fn unclosed_bold_still_renders_text() {
        let lines = render_markdown("some **unfinished", 80);
        let combined: String = lines.iter().map(StyledLine::text).collect();
        assert!(combined.contains("unfinished"));
    }

    #[test]
    fn html_is_skipped() {
        let lines = render_markdown("<script>alert(1)</script>\n\nsafe", 80);
        let combined: String = lines.iter().map(StyledLine::text).collect();
        assert!(!combined.contains("script"));
        assert!(combined.contains("safe"));
    }
}
