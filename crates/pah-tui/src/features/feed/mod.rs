//! Feed rendering: conversation messages to styled lines.
//!
//! Rendering is pure. Tool-call snapshots are collapsed here via
//! [`dedupe_tool_calls`] so the feed itself keeps raw append-only
//! history. Card-local UI state (quiz progress, action overrides)
//! lives in [`FeedUiState`], keyed by message id and deduped part
//! index, which is stable because later snapshots never move a part.

use std::collections::HashMap;

use serde_json::Value;

use pah_core::dedup::dedupe_tool_calls;
use pah_core::feed::{Feed, TurnPhase};
use pah_core::parts::{Message, MessagePart, Role, ToolCallState};

use super::cards::{CardRegistry, QuizProgress, RenderContext};
use crate::markdown::{WrapOptions, render_markdown, wrap_styled_spans};
use crate::style::{Style, StyledLine, StyledSpan};

pub const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Stable identity of a rendered part: message id + deduped index.
pub type PartKey = (String, usize);

/// UI state layered over the feed, never persisted.
#[derive(Debug, Default)]
pub struct FeedUiState {
    /// Quiz progress per quiz card.
    pub quiz: HashMap<PartKey, QuizProgress>,
    /// Local state patches applied after a card action (e.g. a log
    /// draft flips to "saving" before the hub ever re-emits it).
    pub overrides: HashMap<PartKey, Value>,
}

impl FeedUiState {
    pub fn quiz_mut(&mut self, key: &PartKey) -> &mut QuizProgress {
        self.quiz.entry(key.clone()).or_default()
    }

    /// Shallow-merges a patch onto future renders of the part.
    pub fn patch(&mut self, key: PartKey, patch: Value) {
        let entry = self.overrides.entry(key).or_insert_with(|| Value::Object(Default::default()));
        if let (Value::Object(target), Value::Object(source)) = (entry, patch) {
            for (k, v) in source {
                target.insert(k, v);
            }
        }
    }
}

/// A card the user can currently act on.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveCard {
    pub key: PartKey,
    /// Component identifier ("pah-log-draft-card", "confirmation", ...).
    pub kind: String,
    /// Effective payload, overrides applied.
    pub payload: Value,
}

/// Renders the whole feed.
pub fn render_feed(
    feed: &Feed,
    ui: &FeedUiState,
    registry: &CardRegistry,
    width: usize,
    spinner_frame: usize,
) -> Vec<StyledLine> {
    let mut lines = Vec::new();

    if feed.messages().is_empty() {
        lines.push(StyledLine::from_span(StyledSpan::new(
            "Your hub is ready. Type a message to get started.",
            Style::Notice,
        )));
        lines.push(StyledLine::empty());
        for prompt in [
            "Log 45 minutes of code review",
            "What did I work on yesterday?",
            "Quiz me on this week's topic",
        ] {
            lines.push(StyledLine {
                spans: vec![
                    StyledSpan::new("  · ", Style::CardMuted),
                    StyledSpan::new(prompt, Style::Thinking),
                ],
            });
        }
        return lines;
    }

    for message in feed.messages() {
        render_message(message, ui, registry, width, spinner_frame, &mut lines);
        lines.push(StyledLine::empty());
    }

    match feed.phase() {
        TurnPhase::Submitted => {
            let frame = SPINNER_FRAMES[spinner_frame % SPINNER_FRAMES.len()];
            lines.push(StyledLine::from_span(StyledSpan::new(
                format!("{frame} Thinking…"),
                Style::Thinking,
            )));
        }
        TurnPhase::Streaming => {
            // Cursor sits after the last rendered content line.
            if let Some(last) = lines.iter_mut().rev().find(|l| !l.spans.is_empty()) {
                last.spans
                    .push(StyledSpan::new("▌", Style::StreamingCursor));
            }
        }
        TurnPhase::Idle => {}
    }

    lines
}

fn render_message(
    message: &Message,
    ui: &FeedUiState,
    registry: &CardRegistry,
    width: usize,
    spinner_frame: usize,
    lines: &mut Vec<StyledLine>,
) {
    let parts = dedupe_tool_calls(&message.parts);
    for (index, part) in parts.iter().enumerate() {
        let key = (message.id.clone(), index);
        match part {
            MessagePart::Text { content } => match message.role {
                Role::User => render_user_text(content, width, lines),
                Role::Assistant => lines.extend(render_markdown(content, width)),
            },
            MessagePart::Reasoning {
                content,
                is_streaming,
                duration,
            } => render_reasoning(content, *is_streaming, *duration, width, lines),
            MessagePart::File {
                media_type, name, ..
            } => {
                let label = name.as_deref().unwrap_or("attachment");
                lines.push(StyledLine::from_span(StyledSpan::new(
                    format!("📎 {label} ({media_type})"),
                    Style::Notice,
                )));
            }
            part => {
                if let Some((kind, payload)) = card_payload(part) {
                    let payload = apply_override(payload, ui.overrides.get(&key));
                    let ctx = RenderContext {
                        width,
                        quiz: ui.quiz.get(&key),
                    };
                    lines.extend(registry.render(&ctx, &kind, &payload));
                } else {
                    render_tool(part, width, spinner_frame, lines);
                }
            }
        }
    }
}

fn render_user_text(content: &str, width: usize, lines: &mut Vec<StyledLine>) {
    let opts = WrapOptions {
        width,
        first_prefix: vec![StyledSpan::new("│ ", Style::UserPrefix)],
        rest_prefix: vec![StyledSpan::new("│ ", Style::UserPrefix)],
    };
    lines.extend(wrap_styled_spans(
        &[StyledSpan::new(content, Style::User)],
        &opts,
    ));
}

fn render_reasoning(
    content: &str,
    is_streaming: bool,
    duration: Option<f64>,
    width: usize,
    lines: &mut Vec<StyledLine>,
) {
    let mut header = vec![StyledSpan::new("Thinking", Style::ThinkingPrefix)];
    if is_streaming {
        header.push(StyledSpan::new("…", Style::ThinkingPrefix));
    } else if let Some(secs) = duration {
        header.push(StyledSpan::new(format!(" ({secs:.1}s)"), Style::Timing));
    }
    lines.push(StyledLine { spans: header });

    let opts = WrapOptions {
        width,
        first_prefix: vec![StyledSpan::plain("  ")],
        rest_prefix: vec![StyledSpan::plain("  ")],
    };
    lines.extend(wrap_styled_spans(
        &[StyledSpan::new(content, Style::Thinking)],
        &opts,
    ));
}

/// Generic tool rendering for calls that are not hub cards.
fn render_tool(part: &MessagePart, width: usize, spinner_frame: usize, lines: &mut Vec<StyledLine>) {
    let MessagePart::Tool {
        tool_name,
        input,
        output,
        error_text,
        state,
        ..
    } = part
    else {
        return;
    };

    let name = if tool_name.is_empty() { "tool" } else { tool_name };
    let mut spans = vec![StyledSpan::new("⚙ ", Style::ToolBracket)];
    match state {
        ToolCallState::InputStreaming | ToolCallState::InputAvailable => {
            let frame = SPINNER_FRAMES[spinner_frame % SPINNER_FRAMES.len()];
            spans.push(StyledSpan::new(format!("{frame} "), Style::ToolRunning));
            spans.push(StyledSpan::new(name.to_owned(), Style::ToolStatus));
        }
        ToolCallState::OutputAvailable => {
            spans.push(StyledSpan::new(name.to_owned(), Style::ToolSuccess));
        }
        ToolCallState::OutputError => {
            spans.push(StyledSpan::new(name.to_owned(), Style::ToolError));
        }
    }
    if let Some(summary) = summarize_input(input) {
        spans.push(StyledSpan::new(format!(" {summary}"), Style::ToolStatus));
    }
    lines.push(StyledLine { spans });

    if let Some(error) = error_text {
        lines.push(StyledLine {
            spans: vec![
                StyledSpan::plain("  "),
                StyledSpan::new(error.clone(), Style::ToolError),
            ],
        });
    } else if let Some(output) = output {
        for line in output_lines(output, width) {
            lines.push(StyledLine {
                spans: vec![
                    StyledSpan::plain("  "),
                    StyledSpan::new(line, Style::ToolStatus),
                ],
            });
        }
    }
}

fn summarize_input(input: &Value) -> Option<String> {
    match input {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        other => {
            let raw = serde_json::to_string(other).unwrap_or_default();
            Some(truncate(&raw, 72))
        }
    }
}

const OUTPUT_DUMP_LINES: usize = 12;

/// Tool output rendered under the status line. Strings keep their
/// first line; structured values get a pretty dump so every field of
/// an unfamiliar tool's result stays visible.
fn output_lines(output: &Value, width: usize) -> Vec<String> {
    let max = width.saturating_sub(2).max(16);
    match output {
        Value::Null => Vec::new(),
        Value::String(s) => {
            let first = s.lines().next().unwrap_or_default();
            if first.is_empty() {
                Vec::new()
            } else {
                vec![truncate(first, max)]
            }
        }
        other => {
            let pretty = serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string());
            let mut out: Vec<String> = pretty
                .lines()
                .take(OUTPUT_DUMP_LINES)
                .map(|line| truncate(line, max))
                .collect();
            if pretty.lines().count() > OUTPUT_DUMP_LINES {
                out.push("…".to_owned());
            }
            out
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Extracts a renderable card from a part, if it is one.
///
/// Hub tools stream cards as tool calls named after the component; the
/// payload is the tool output once available. Parts that are already
/// card variants carry their own payload.
pub fn card_payload(part: &MessagePart) -> Option<(String, Value)> {
    match part {
        MessagePart::Tool {
            tool_name,
            output: Some(output),
            state: ToolCallState::OutputAvailable,
            ..
        } if tool_name.starts_with("pah-") => Some((tool_name.clone(), output.clone())),
        MessagePart::Text { .. }
        | MessagePart::Reasoning { .. }
        | MessagePart::Tool { .. }
        | MessagePart::File { .. } => None,
        other => {
            let value = serde_json::to_value(other).ok()?;
            Some((other.kind().to_owned(), value))
        }
    }
}

fn apply_override(mut payload: Value, patch: Option<&Value>) -> Value {
    if let (Value::Object(target), Some(Value::Object(source))) = (&mut payload, patch) {
        for (k, v) in source {
            target.insert(k.clone(), v.clone());
        }
    }
    payload
}

/// Finds the most recent card the user can act on, overrides applied.
pub fn find_active_card(feed: &Feed, ui: &FeedUiState) -> Option<ActiveCard> {
    for message in feed.messages().iter().rev() {
        let parts = dedupe_tool_calls(&message.parts);
        for (index, part) in parts.iter().enumerate().rev() {
            let Some((kind, payload)) = card_payload(part) else {
                continue;
            };
            let key = (message.id.clone(), index);
            let payload = apply_override(payload, ui.overrides.get(&key));
            if is_actionable(&kind, &payload, ui, &key) {
                return Some(ActiveCard { key, kind, payload });
            }
        }
    }
    None
}

fn is_actionable(kind: &str, payload: &Value, ui: &FeedUiState, key: &PartKey) -> bool {
    let state = payload.get("state").and_then(Value::as_str).unwrap_or("");
    match kind {
        "pah-log-draft-card" => state.is_empty() || state == "editing",
        "pah-timesheet-form" => state.is_empty() || state == "input",
        "pah-resource-preview" => state.is_empty() || state == "editing",
        "confirmation" => state.is_empty() || state == "approval-requested",
        "pah-news-digest" => payload
            .get("items")
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty()),
        "pah-learning-plan" => {
            payload.get("startedSessionId").is_none()
                && payload
                    .get("sessions")
                    .and_then(Value::as_array)
                    .is_some_and(|sessions| !sessions.is_empty())
        }
        "pah-quiz" => {
            let total = payload
                .get("questions")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            total > 0
                && !ui
                    .quiz
                    .get(key)
                    .is_some_and(|progress| progress.is_finished(total))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pah_core::events::ChatEvent;
    use serde_json::json;

    fn combined(lines: &[StyledLine]) -> String {
        lines
            .iter()
            .map(StyledLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn quiz_tool_part(id: &str) -> MessagePart {
        MessagePart::Tool {
            tool_call_id: id.into(),
            tool_name: "pah-quiz".into(),
            input: json!({}),
            output: Some(json!({
                "questions": [
                    {
                        "id": "q1",
                        "type": "multiple-choice",
                        "question": "q",
                        "options": [
                            { "id": "a", "text": "a" },
                            { "id": "b", "text": "b" }
                        ],
                        "correctAnswer": "a",
                        "explanation": ""
                    }
                ]
            })),
            error_text: None,
            state: ToolCallState::OutputAvailable,
        }
    }

    fn feed_with_parts(parts: Vec<MessagePart>) -> Feed {
        let mut feed = Feed::new();
        feed.push_user_message("hi");
        feed.apply_chat_event(&ChatEvent::TurnStarted {
            message_id: "m1".into(),
        });
        for part in parts {
            feed.apply_chat_event(&ChatEvent::PartAdded { part });
        }
        feed.apply_chat_event(&ChatEvent::TurnCompleted);
        feed
    }

    #[test]
    fn empty_feed_renders_a_welcome_line() {
        let feed = Feed::new();
        let ui = FeedUiState::default();
        let registry = CardRegistry::with_defaults();
        let lines = render_feed(&feed, &ui, &registry, 80, 0);
        assert!(combined(&lines).contains("Type a message"));
    }

    #[test]
    fn duplicate_tool_snapshots_render_once() {
        let mut feed = Feed::new();
        feed.push_user_message("hi");
        feed.apply_chat_event(&ChatEvent::TurnStarted {
            message_id: "m1".into(),
        });
        for state in [
            ToolCallState::InputStreaming,
            ToolCallState::InputAvailable,
        ] {
            feed.apply_chat_event(&ChatEvent::PartAdded {
                part: MessagePart::Tool {
                    tool_call_id: "c1".into(),
                    tool_name: "search".into(),
                    input: json!({"q": "rust"}),
                    output: None,
                    error_text: None,
                    state,
                },
            });
        }
        feed.apply_chat_event(&ChatEvent::TurnCompleted);

        let ui = FeedUiState::default();
        let registry = CardRegistry::with_defaults();
        let text = combined(&render_feed(&feed, &ui, &registry, 80, 0));
        assert_eq!(text.matches("search").count(), 1);
    }

    #[test]
    fn pah_tool_output_renders_as_a_card() {
        let feed = feed_with_parts(vec![quiz_tool_part("c1")]);
        let ui = FeedUiState::default();
        let registry = CardRegistry::with_defaults();
        let text = combined(&render_feed(&feed, &ui, &registry, 80, 0));
        assert!(text.contains("Quiz"));
        assert!(text.contains("ctrl+1..4 answer"));
    }

    #[test]
    fn active_card_scan_finds_the_latest_actionable_card() {
        let feed = feed_with_parts(vec![
            MessagePart::LogDraftCard {
                default_values: Default::default(),
                workspaces: vec![],
                suggested_tags: vec![],
                state: pah_core::components::LogDraftState::Saved,
                original_message: None,
            },
            quiz_tool_part("c1"),
        ]);
        let ui = FeedUiState::default();
        let card = find_active_card(&feed, &ui).expect("quiz should be actionable");
        assert_eq!(card.kind, "pah-quiz");
    }

    #[test]
    fn override_patch_retires_a_card() {
        let feed = feed_with_parts(vec![MessagePart::ResourcePreview {
            data: Default::default(),
            state: pah_core::components::ResourceState::Editing,
        }]);
        let mut ui = FeedUiState::default();
        let card = find_active_card(&feed, &ui).expect("editing resource is actionable");
        assert_eq!(card.kind, "pah-resource-preview");
        ui.patch(card.key.clone(), json!({ "state": "saved" }));
        assert_eq!(find_active_card(&feed, &ui), None);
    }

    #[test]
    fn unknown_tool_output_renders_as_a_structured_dump() {
        let feed = feed_with_parts(vec![MessagePart::Tool {
            tool_call_id: "c1".into(),
            tool_name: "unknown-tool-x".into(),
            input: json!({}),
            output: Some(json!({
                "status": "done",
                "rows": 3,
                "detail": { "cursor": "abc" }
            })),
            error_text: None,
            state: ToolCallState::OutputAvailable,
        }]);
        let ui = FeedUiState::default();
        let registry = CardRegistry::with_defaults();
        let text = combined(&render_feed(&feed, &ui, &registry, 120, 0));
        assert!(text.contains("unknown-tool-x"));
        assert!(text.contains("\"status\": \"done\""));
        assert!(text.contains("\"rows\": 3"));
        assert!(text.contains("\"cursor\": \"abc\""));
    }

    #[test]
    fn news_digest_with_items_is_actionable() {
        let feed = feed_with_parts(vec![MessagePart::Tool {
            tool_call_id: "c1".into(),
            tool_name: "pah-news-digest".into(),
            input: json!({}),
            output: Some(json!({
                "items": [
                    { "id": "n1", "title": "First", "summary": "a", "url": "https://a.example", "relevanceScore": 90, "source": "Feed A" }
                ]
            })),
            error_text: None,
            state: ToolCallState::OutputAvailable,
        }]);
        let mut ui = FeedUiState::default();
        let card = find_active_card(&feed, &ui).expect("digest with items is actionable");
        assert_eq!(card.kind, "pah-news-digest");
        ui.patch(card.key.clone(), json!({ "items": [] }));
        assert_eq!(find_active_card(&feed, &ui), None);
    }

    #[test]
    fn started_learning_plan_is_settled() {
        let plan = MessagePart::Tool {
            tool_call_id: "c1".into(),
            tool_name: "pah-learning-plan".into(),
            input: json!({}),
            output: Some(json!({
                "sessions": [
                    { "id": "s1", "title": "Ownership", "reason": "", "estimatedTime": "5 mins" }
                ]
            })),
            error_text: None,
            state: ToolCallState::OutputAvailable,
        };
        let feed = feed_with_parts(vec![plan]);
        let mut ui = FeedUiState::default();
        let card = find_active_card(&feed, &ui).expect("unstarted plan is actionable");
        assert_eq!(card.kind, "pah-learning-plan");
        ui.patch(card.key.clone(), json!({ "startedSessionId": "s1" }));
        assert_eq!(find_active_card(&feed, &ui), None);
    }

    #[test]
    fn streaming_turn_gets_a_cursor() {
        let mut feed = Feed::new();
        feed.push_user_message("hi");
        feed.apply_chat_event(&ChatEvent::TurnStarted {
            message_id: "m1".into(),
        });
        feed.apply_chat_event(&ChatEvent::TextDelta {
            text: "partial".into(),
        });
        let ui = FeedUiState::default();
        let registry = CardRegistry::with_defaults();
        let text = combined(&render_feed(&feed, &ui, &registry, 80, 0));
        assert!(text.contains("partial▌"));
    }

    #[test]
    fn submitted_turn_shows_thinking_placeholder() {
        let mut feed = Feed::new();
        feed.push_user_message("hi");
        let ui = FeedUiState::default();
        let registry = CardRegistry::with_defaults();
        let text = combined(&render_feed(&feed, &ui, &registry, 80, 0));
        assert!(text.contains("Thinking…"));
    }
}
