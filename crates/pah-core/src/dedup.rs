//! Tool-call reconciliation.
//!
//! The hub re-emits a full tool part on every lifecycle transition, so
//! a raw message holds several snapshots of the same call. Rendering
//! must show exactly one: the most advanced snapshot, at the position
//! where the call first appeared.

use std::collections::{HashMap, HashSet};

use crate::parts::MessagePart;

/// Collapses repeated tool-call snapshots to one part per call id.
///
/// Two passes: the first picks the winning snapshot per `tool_call_id`
/// (higher lifecycle rank replaces; equal rank refreshes the payload so
/// the last observed snapshot wins; lower rank never regresses a call).
/// The second emits parts in order, substituting the winner at the
/// call's first occurrence and dropping later duplicates. Non-tool
/// parts pass through untouched.
pub fn dedupe_tool_calls(parts: &[MessagePart]) -> Vec<MessagePart> {
    struct Winner {
        index: usize,
        rank: u8,
    }

    let mut winners: HashMap<&str, Winner> = HashMap::new();
    for (index, part) in parts.iter().enumerate() {
        let MessagePart::Tool {
            tool_call_id,
            state,
            ..
        } = part
        else {
            continue;
        };
        let rank = state.rank();
        winners
            .entry(tool_call_id.as_str())
            .and_modify(|winner| {
                if rank >= winner.rank {
                    winner.index = index;
                    winner.rank = rank;
                }
            })
            .or_insert(Winner { index, rank });
    }

    let mut emitted: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        let MessagePart::Tool { tool_call_id, .. } = part else {
            out.push(part.clone());
            continue;
        };
        if !emitted.insert(tool_call_id.as_str()) {
            continue;
        }
        let winner = &winners[tool_call_id.as_str()];
        out.push(parts[winner.index].clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::ToolCallState;

    fn tool(id: &str, state: ToolCallState, input: serde_json::Value) -> MessagePart {
        MessagePart::Tool {
            tool_call_id: id.into(),
            tool_name: "pah-quiz".into(),
            input,
            output: None,
            error_text: None,
            state,
        }
    }

    fn text(content: &str) -> MessagePart {
        MessagePart::Text {
            content: content.into(),
        }
    }

    fn tool_states(parts: &[MessagePart]) -> Vec<(String, ToolCallState)> {
        parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Tool {
                    tool_call_id,
                    state,
                    ..
                } => Some((tool_call_id.clone(), *state)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn one_part_per_call_id_with_most_advanced_state() {
        let parts = vec![
            tool("a", ToolCallState::InputStreaming, serde_json::json!({})),
            tool("a", ToolCallState::InputAvailable, serde_json::json!({"q": 1})),
            tool("b", ToolCallState::InputStreaming, serde_json::json!({})),
            tool("a", ToolCallState::OutputAvailable, serde_json::json!({"q": 1})),
        ];
        let out = dedupe_tool_calls(&parts);
        assert_eq!(
            tool_states(&out),
            vec![
                ("a".into(), ToolCallState::OutputAvailable),
                ("b".into(), ToolCallState::InputStreaming),
            ]
        );
    }

    #[test]
    fn deduplication_is_idempotent() {
        let parts = vec![
            tool("a", ToolCallState::InputStreaming, serde_json::json!({})),
            text("hi"),
            tool("a", ToolCallState::OutputAvailable, serde_json::json!({"x": 1})),
            tool("b", ToolCallState::InputAvailable, serde_json::json!({})),
        ];
        let once = dedupe_tool_calls(&parts);
        let twice = dedupe_tool_calls(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn call_keeps_first_occurrence_position() {
        let parts = vec![
            text("before"),
            tool("a", ToolCallState::InputStreaming, serde_json::json!({})),
            text("between"),
            tool("a", ToolCallState::OutputAvailable, serde_json::json!({})),
            text("after"),
        ];
        let out = dedupe_tool_calls(&parts);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], text("before"));
        assert!(matches!(
            out[1],
            MessagePart::Tool {
                state: ToolCallState::OutputAvailable,
                ..
            }
        ));
        assert_eq!(out[2], text("between"));
        assert_eq!(out[3], text("after"));
    }

    #[test]
    fn stale_snapshot_never_regresses_a_call() {
        // Out-of-order delivery: terminal snapshot arrives first.
        let parts = vec![
            tool("a", ToolCallState::OutputAvailable, serde_json::json!({"v": 2})),
            tool("a", ToolCallState::InputStreaming, serde_json::json!({"v": 1})),
        ];
        let out = dedupe_tool_calls(&parts);
        assert_eq!(
            tool_states(&out),
            vec![("a".into(), ToolCallState::OutputAvailable)]
        );
        let MessagePart::Tool { input, .. } = &out[0] else {
            unreachable!()
        };
        assert_eq!(input["v"], 2);
    }

    #[test]
    fn equal_rank_refreshes_payload_in_place() {
        let parts = vec![
            tool("a", ToolCallState::InputStreaming, serde_json::json!({"partial": "he"})),
            tool("a", ToolCallState::InputStreaming, serde_json::json!({"partial": "hello"})),
        ];
        let out = dedupe_tool_calls(&parts);
        assert_eq!(out.len(), 1);
        let MessagePart::Tool { input, .. } = &out[0] else {
            unreachable!()
        };
        assert_eq!(input["partial"], "hello");
    }

    #[test]
    fn error_after_output_wins_payload_without_downgrade() {
        // Both states are terminal; the later snapshot carries the error.
        let parts = vec![
            tool("a", ToolCallState::OutputAvailable, serde_json::json!({})),
            MessagePart::Tool {
                tool_call_id: "a".into(),
                tool_name: "pah-quiz".into(),
                input: serde_json::json!({}),
                output: None,
                error_text: Some("upstream failed".into()),
                state: ToolCallState::OutputError,
            },
        ];
        let out = dedupe_tool_calls(&parts);
        assert_eq!(
            tool_states(&out),
            vec![("a".into(), ToolCallState::OutputError)]
        );
    }

    #[test]
    fn non_tool_parts_pass_through_unchanged() {
        let parts = vec![
            text("hello"),
            MessagePart::Reasoning {
                content: "thinking".into(),
                is_streaming: false,
                duration: Some(1.2),
            },
        ];
        assert_eq!(dedupe_tool_calls(&parts), parts);
    }

    #[test]
    fn interleaved_calls_each_resolve_independently() {
        let parts = vec![
            tool("a", ToolCallState::InputStreaming, serde_json::json!({})),
            tool("b", ToolCallState::InputAvailable, serde_json::json!({})),
            tool("a", ToolCallState::InputAvailable, serde_json::json!({})),
            tool("b", ToolCallState::OutputAvailable, serde_json::json!({})),
            tool("a", ToolCallState::OutputError, serde_json::json!({})),
        ];
        let out = dedupe_tool_calls(&parts);
        assert_eq!(
            tool_states(&out),
            vec![
                ("a".into(), ToolCallState::OutputError),
                ("b".into(), ToolCallState::OutputAvailable),
            ]
        );
    }
}
