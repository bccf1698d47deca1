//! UI-agnostic styled text.
//!
//! Feed and card rendering produce these; the ratatui conversion
//! happens once at the draw boundary. Keeping semantic styles here
//! lets the rendering pipeline be tested without a terminal.

/// A styled span of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Style,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::Plain)
    }
}

/// A line of styled spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn empty() -> Self {
        StyledLine { spans: vec![] }
    }

    pub fn from_span(span: StyledSpan) -> Self {
        StyledLine { spans: vec![span] }
    }

    /// Concatenated text of the line, styles dropped.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Semantic style identifiers, translated to terminal styles at draw
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    /// User message prefix ("│ ").
    UserPrefix,
    User,
    Assistant,
    /// Streaming cursor indicator.
    StreamingCursor,
    /// Reasoning block prefix ("Thinking: ").
    ThinkingPrefix,
    /// Reasoning content (dim/italic).
    Thinking,
    /// Reasoning duration suffix.
    Timing,
    /// Tool bracket/decoration.
    ToolBracket,
    /// Tool status text.
    ToolStatus,
    ToolError,
    /// Tool running spinner.
    ToolRunning,
    ToolSuccess,
    /// Connection / transient notice text.
    Notice,
    NoticeError,

    // Card styles
    /// Card frame and separators.
    CardBorder,
    CardTitle,
    /// Field labels inside a card.
    CardLabel,
    /// Field values inside a card.
    CardValue,
    /// Key hints for actionable cards.
    CardAction,
    /// Settled state badge (saved, confirmed).
    CardDone,
    /// Cancelled/denied state badge.
    CardMuted,

    // Markdown styles
    CodeInline,
    CodeBlock,
    /// Code fence markers, rendered subtly.
    CodeFence,
    Emphasis,
    Strong,
    H1,
    H2,
    H3,
    Link,
    BlockQuote,
    ListBullet,
    ListNumber,
}
