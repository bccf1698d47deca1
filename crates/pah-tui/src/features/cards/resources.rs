//! Reading cards: resource preview and news digest.

use serde::Deserialize;
use serde_json::Value;

use pah_core::components::{NewsItem, ResourcePreviewData, ResourceState};

use super::{
    RenderContext, badge_line, field_line, footer_line, payload_as, title_line,
    wrapped_field_lines,
};
use crate::style::{Style, StyledLine, StyledSpan};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourcePayload {
    #[serde(default)]
    data: ResourcePreviewData,
    #[serde(default)]
    state: ResourceState,
}

pub(super) fn render_resource_preview(ctx: &RenderContext, payload: &Value) -> Vec<StyledLine> {
    let card: ResourcePayload = payload_as(payload);
    let data = &card.data;

    let mut lines = vec![title_line("Resource Preview")];
    lines.push(field_line("Title", &data.title));
    lines.push(field_line("URL", &data.url));
    if !data.domain.is_empty() {
        lines.push(field_line("Domain", &data.domain));
    }
    if !data.ai_summary.is_empty() {
        lines.extend(wrapped_field_lines(ctx.width, &data.ai_summary, Style::CardValue));
    }
    if !data.user_intent.is_empty() {
        lines.push(field_line("Intent", &data.user_intent));
    }
    if !data.tags.is_empty() {
        lines.push(field_line("Tags", &data.tags.join(", ")));
    }
    match card.state {
        ResourceState::Editing => {
            lines.push(footer_line(&["ctrl+s save", "ctrl+l read later"]));
        }
        ResourceState::Saving => {
            lines.push(badge_line("Saving…", Style::ToolRunning));
            lines.push(footer_line(&[]));
        }
        ResourceState::Saved => {
            lines.push(badge_line("✓ Saved to library", Style::CardDone));
            lines.push(footer_line(&[]));
        }
    }
    lines
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsPayload {
    #[serde(default)]
    items: Vec<NewsItem>,
}

pub(super) fn render_news_digest(ctx: &RenderContext, payload: &Value) -> Vec<StyledLine> {
    let card: NewsPayload = payload_as(payload);

    let mut lines = vec![title_line("News Digest")];
    if card.items.is_empty() {
        lines.push(badge_line("Nothing new right now.", Style::CardMuted));
    }
    for (index, item) in card.items.iter().enumerate() {
        lines.push(StyledLine {
            spans: vec![
                StyledSpan::new("│ ", Style::CardBorder),
                StyledSpan::new(format!("{}. ", index + 1), Style::ListNumber),
                StyledSpan::new(item.title.clone(), Style::Strong),
                StyledSpan::new(
                    format!("  ({} · {}%)", item.source, item.relevance_score),
                    Style::CardMuted,
                ),
            ],
        });
        if !item.summary.is_empty() {
            lines.extend(wrapped_field_lines(ctx.width, &item.summary, Style::CardValue));
        }
        if !item.url.is_empty() {
            lines.push(StyledLine {
                spans: vec![
                    StyledSpan::new("│ ", Style::CardBorder),
                    StyledSpan::new(item.url.clone(), Style::Link),
                ],
            });
        }
    }
    if card.items.is_empty() {
        lines.push(footer_line(&[]));
    } else {
        lines.push(footer_line(&["ctrl+b bookmark top", "ctrl+x dismiss top"]));
    }
    lines
}
