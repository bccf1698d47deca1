//! Interactive component cards.
//!
//! The hub's tools emit structured payloads that render as framed
//! cards in the feed. Dispatch goes through an explicit registry keyed
//! by component identifier; unknown identifiers hit a fallback that
//! shows the raw payload instead of disappearing.

mod confirm;
mod learning;
mod resources;
mod worklog;

pub use learning::QuizProgress;

use std::collections::HashMap;

use serde_json::Value;

use crate::markdown::{WrapOptions, wrap_styled_spans};
use crate::style::{Style, StyledLine, StyledSpan};

/// Per-part context handed to every card renderer.
pub struct RenderContext<'a> {
    pub width: usize,
    /// Local quiz state for this part, when the part is a quiz.
    pub quiz: Option<&'a QuizProgress>,
}

impl RenderContext<'_> {
    pub fn new(width: usize) -> Self {
        RenderContext { width, quiz: None }
    }
}

pub type CardRenderFn = fn(&RenderContext, &Value) -> Vec<StyledLine>;

/// Maps component identifiers to renderers.
pub struct CardRegistry {
    entries: HashMap<&'static str, CardRenderFn>,
    fallback: CardRenderFn,
}

impl CardRegistry {
    /// Registry with every built-in card wired up.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            entries: HashMap::new(),
            fallback: render_unknown,
        };
        registry.register("pah-log-draft-card", worklog::render_log_draft);
        registry.register("pah-timesheet-form", worklog::render_timesheet);
        registry.register("pah-daily-summary", worklog::render_daily_summary);
        registry.register("pah-resource-preview", resources::render_resource_preview);
        registry.register("pah-news-digest", resources::render_news_digest);
        registry.register("pah-learning-plan", learning::render_learning_plan);
        registry.register("pah-quiz", learning::render_quiz);
        registry.register("confirmation", confirm::render_confirmation);
        registry
    }

    pub fn register(&mut self, kind: &'static str, renderer: CardRenderFn) {
        self.entries.insert(kind, renderer);
    }

    /// Renders a card payload, falling back for unknown identifiers.
    pub fn render(&self, ctx: &RenderContext, kind: &str, payload: &Value) -> Vec<StyledLine> {
        let renderer = self.entries.get(kind).copied().unwrap_or(self.fallback);
        renderer(ctx, payload)
    }

    pub fn knows(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }
}

/// Tolerant payload decode: malformed or partial card data renders as
/// an empty card instead of breaking the feed.
pub(crate) fn payload_as<T: Default + serde::de::DeserializeOwned>(payload: &Value) -> T {
    serde_json::from_value(payload.clone()).unwrap_or_default()
}

fn render_unknown(ctx: &RenderContext, payload: &Value) -> Vec<StyledLine> {
    let mut lines = vec![title_line("component")];
    let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    for raw in pretty.lines().take(8) {
        lines.extend(wrapped_field_lines(ctx.width, raw, Style::CardValue));
    }
    lines
}

// Shared card building blocks.

pub(crate) fn title_line(title: &str) -> StyledLine {
    StyledLine {
        spans: vec![
            StyledSpan::new("┌ ", Style::CardBorder),
            StyledSpan::new(title.to_owned(), Style::CardTitle),
        ],
    }
}

pub(crate) fn field_line(label: &str, value: &str) -> StyledLine {
    StyledLine {
        spans: vec![
            StyledSpan::new("│ ", Style::CardBorder),
            StyledSpan::new(format!("{label}: "), Style::CardLabel),
            StyledSpan::new(value.to_owned(), Style::CardValue),
        ],
    }
}

pub(crate) fn body_line(text: &str, style: Style) -> StyledLine {
    StyledLine {
        spans: vec![
            StyledSpan::new("│ ", Style::CardBorder),
            StyledSpan::new(text.to_owned(), style),
        ],
    }
}

/// Body text wrapped under the card's left border.
pub(crate) fn wrapped_field_lines(width: usize, text: &str, style: Style) -> Vec<StyledLine> {
    let opts = WrapOptions {
        width,
        first_prefix: vec![StyledSpan::new("│ ", Style::CardBorder)],
        rest_prefix: vec![StyledSpan::new("│ ", Style::CardBorder)],
    };
    wrap_styled_spans(&[StyledSpan::new(text, style)], &opts)
}

/// Closing line, optionally carrying key hints for actionable cards.
pub(crate) fn footer_line(hints: &[&str]) -> StyledLine {
    let mut spans = vec![StyledSpan::new("└", Style::CardBorder)];
    for hint in hints {
        spans.push(StyledSpan::new(format!(" [{hint}]"), Style::CardAction));
    }
    StyledLine { spans }
}

pub(crate) fn badge_line(text: &str, style: Style) -> StyledLine {
    StyledLine {
        spans: vec![
            StyledSpan::new("│ ", Style::CardBorder),
            StyledSpan::new(text.to_owned(), style),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn combined(lines: &[StyledLine]) -> String {
        lines
            .iter()
            .map(StyledLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn unknown_component_falls_back_to_raw_payload() {
        let registry = CardRegistry::with_defaults();
        let ctx = RenderContext::new(80);
        let lines = registry.render(&ctx, "pah-crystal-ball", &json!({ "omen": "rain" }));
        assert!(!lines.is_empty());
        assert!(combined(&lines).contains("omen"));
    }

    #[test]
    fn defaults_cover_all_hub_components() {
        let registry = CardRegistry::with_defaults();
        for kind in [
            "pah-log-draft-card",
            "pah-timesheet-form",
            "pah-daily-summary",
            "pah-resource-preview",
            "pah-news-digest",
            "pah-learning-plan",
            "pah-quiz",
            "confirmation",
        ] {
            assert!(registry.knows(kind), "missing renderer for {kind}");
        }
    }

    #[test]
    fn custom_registration_overrides_the_fallback() {
        let mut registry = CardRegistry::with_defaults();
        fn stub(_: &RenderContext, _: &Value) -> Vec<StyledLine> {
            vec![StyledLine::from_span(StyledSpan::plain("stub"))]
        }
        registry.register("pah-custom", stub);
        let ctx = RenderContext::new(80);
        let lines = registry.render(&ctx, "pah-custom", &json!({}));
        assert_eq!(combined(&lines), "stub");
    }
}
