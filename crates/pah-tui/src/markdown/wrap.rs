//! Width-aware wrapping of styled spans.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::style::{Style, StyledLine, StyledSpan};

/// Options for wrapping with hanging indents.
#[derive(Debug, Clone, Default)]
pub struct WrapOptions {
    /// Maximum display width for lines.
    pub width: usize,
    /// Prefix spans for the first line (e.g. a list bullet).
    pub first_prefix: Vec<StyledSpan>,
    /// Prefix spans for continuation lines.
    pub rest_prefix: Vec<StyledSpan>,
}

impl WrapOptions {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            first_prefix: vec![],
            rest_prefix: vec![],
        }
    }
}

/// A wrap-atomic unit derived from the input spans.
#[derive(Debug)]
enum Atom {
    Word(StyledSpan),
    /// Collapsible space between words.
    Space(Style),
    /// Hard line break.
    Break,
}

/// Wraps styled spans at word boundaries, preserving styles across
/// breaks. Inline and block code keep their whitespace and break by
/// character only when a fragment exceeds the line.
pub fn wrap_styled_spans(spans: &[StyledSpan], opts: &WrapOptions) -> Vec<StyledLine> {
    if opts.width == 0 || spans.is_empty() {
        let mut all = opts.first_prefix.clone();
        all.extend(spans.iter().cloned());
        return vec![StyledLine { spans: all }];
    }

    let atoms = tokenize(spans);
    layout(&atoms, opts)
}

fn tokenize(spans: &[StyledSpan]) -> Vec<Atom> {
    let mut atoms = Vec::new();
    for span in spans {
        let is_code = matches!(span.style, Style::CodeInline | Style::CodeBlock);
        for (i, segment) in span.text.split('\n').enumerate() {
            if i > 0 {
                atoms.push(Atom::Break);
            }
            if segment.is_empty() {
                continue;
            }
            if is_code {
                // Code keeps internal whitespace intact.
                atoms.push(Atom::Word(StyledSpan::new(segment, span.style)));
                continue;
            }
            if segment.starts_with(|c: char| c.is_whitespace()) {
                atoms.push(Atom::Space(span.style));
            }
            let words: Vec<&str> = segment.split_whitespace().collect();
            for (j, word) in words.iter().enumerate() {
                if j > 0 {
                    atoms.push(Atom::Space(span.style));
                }
                atoms.push(Atom::Word(StyledSpan::new(*word, span.style)));
            }
            if !words.is_empty() && segment.ends_with(|c: char| c.is_whitespace()) {
                atoms.push(Atom::Space(span.style));
            }
        }
    }
    atoms
}

struct LineBuilder<'a> {
    lines: Vec<StyledLine>,
    current: Vec<StyledSpan>,
    current_width: usize,
    opts: &'a WrapOptions,
}

impl<'a> LineBuilder<'a> {
    fn new(opts: &'a WrapOptions) -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            current_width: 0,
            opts,
        }
    }

    fn available(&self) -> usize {
        let prefix = if self.lines.is_empty() {
            &self.opts.first_prefix
        } else {
            &self.opts.rest_prefix
        };
        let prefix_width: usize = prefix.iter().map(|s| s.text.width()).sum();
        self.opts.width.saturating_sub(prefix_width)
    }

    fn flush(&mut self) {
        let prefix = if self.lines.is_empty() {
            self.opts.first_prefix.clone()
        } else {
            self.opts.rest_prefix.clone()
        };
        let mut spans = prefix;
        spans.append(&mut self.current);
        self.lines.push(StyledLine { spans });
        self.current_width = 0;
    }

    fn push_span(&mut self, span: StyledSpan) {
        self.current_width += span.text.width();
        self.current.push(span);
    }
}

fn layout(atoms: &[Atom], opts: &WrapOptions) -> Vec<StyledLine> {
    let mut builder = LineBuilder::new(opts);

    for atom in atoms {
        match atom {
            Atom::Break => builder.flush(),
            Atom::Space(style) => {
                // Spaces never open a line and never force a wrap.
                if !builder.current.is_empty() && builder.current_width < builder.available() {
                    builder.push_span(StyledSpan::new(" ", *style));
                }
            }
            Atom::Word(word) => {
                let width = word.text.width();
                let available = builder.available();
                if builder.current_width + width <= available {
                    builder.push_span(word.clone());
                    continue;
                }
                if !builder.current.is_empty() {
                    trim_trailing_space(&mut builder);
                    builder.flush();
                }
                if width <= builder.available() {
                    builder.push_span(word.clone());
                    continue;
                }
                // Word wider than a whole line: break by character.
                for fragment in break_by_width(word, builder.available().max(1)) {
                    if builder.current_width + fragment.text.width() > builder.available()
                        && !builder.current.is_empty()
                    {
                        builder.flush();
                    }
                    builder.push_span(fragment);
                }
            }
        }
    }

    if !builder.current.is_empty() {
        builder.flush();
    }
    if builder.lines.is_empty() {
        builder.lines.push(StyledLine {
            spans: opts.first_prefix.clone(),
        });
    }
    builder.lines
}

fn trim_trailing_space(builder: &mut LineBuilder) {
    if let Some(last) = builder.current.last() {
        if last.text == " " {
            builder.current_width -= 1;
            builder.current.pop();
        }
    }
}

fn break_by_width(span: &StyledSpan, max_width: usize) -> Vec<StyledSpan> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for ch in span.text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if ch_width == 0 {
            // Zero-width characters stay with the current fragment.
            current.push(ch);
            continue;
        }
        if current_width + ch_width > max_width && !current.is_empty() {
            parts.push(StyledSpan::new(std::mem::take(&mut current), span.style));
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }
    if !current.is_empty() {
        parts.push(StyledSpan::new(current, span.style));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[StyledLine]) -> Vec<String> {
        lines.iter().map(StyledLine::text).collect()
    }

    #[test]
    fn short_text_stays_on_one_line() {
        let spans = vec![StyledSpan::new("hello world", Style::Assistant)];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(20));
        assert_eq!(texts(&lines), vec!["hello world"]);
        assert!(lines[0].spans.iter().all(|s| s.style == Style::Assistant));
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let spans = vec![StyledSpan::new("hello world", Style::Assistant)];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(8));
        assert_eq!(texts(&lines), vec!["hello", "world"]);
    }

    #[test]
    fn style_survives_a_line_break() {
        let spans = vec![
            StyledSpan::new("hello ", Style::Assistant),
            StyledSpan::new("world", Style::Strong),
        ];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(8));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].spans.iter().any(|s| s.style == Style::Strong));
    }

    #[test]
    fn inline_code_keeps_internal_whitespace() {
        let spans = vec![StyledSpan::new("foo  bar", Style::CodeInline)];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(20));
        assert_eq!(lines[0].spans[0].text, "foo  bar");
    }

    #[test]
    fn newline_forces_a_break() {
        let spans = vec![StyledSpan::new("line1\nline2", Style::Assistant)];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(20));
        assert_eq!(texts(&lines), vec!["line1", "line2"]);
    }

    #[test]
    fn hanging_indent_applies_to_continuation_lines() {
        let spans = vec![StyledSpan::new(
            "this is a longer text that should wrap",
            Style::Assistant,
        )];
        let opts = WrapOptions {
            width: 20,
            first_prefix: vec![StyledSpan::new("• ", Style::ListBullet)],
            rest_prefix: vec![StyledSpan::plain("  ")],
        };
        let lines = wrap_styled_spans(&spans, &opts);
        assert!(lines.len() > 1);
        assert_eq!(lines[0].spans[0].text, "• ");
        assert_eq!(lines[1].spans[0].text, "  ");
    }

    #[test]
    fn overlong_word_breaks_by_character() {
        let spans = vec![StyledSpan::new("abcdefghij", Style::Assistant)];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(4));
        assert_eq!(texts(&lines), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn zero_width_degenerates_to_single_line() {
        let spans = vec![StyledSpan::new("text", Style::Assistant)];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(0));
        assert_eq!(lines.len(), 1);
    }
}
