//! Approval card for confirmation-gated tools.

use serde::Deserialize;
use serde_json::Value;

use pah_core::parts::ConfirmationState;

use super::{RenderContext, badge_line, field_line, footer_line, payload_as, title_line};
use crate::style::{Style, StyledLine};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmationPayload {
    #[serde(default)]
    tool_name: String,
    #[serde(default = "default_state")]
    state: ConfirmationState,
    #[serde(default)]
    approved: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
}

fn default_state() -> ConfirmationState {
    ConfirmationState::ApprovalRequested
}

impl Default for ConfirmationPayload {
    fn default() -> Self {
        Self {
            tool_name: String::new(),
            state: default_state(),
            approved: None,
            reason: None,
        }
    }
}

pub(super) fn render_confirmation(_ctx: &RenderContext, payload: &Value) -> Vec<StyledLine> {
    let card: ConfirmationPayload = payload_as(payload);

    let mut lines = vec![title_line("Approval Required")];
    lines.push(field_line("Tool", &card.tool_name));
    if let Some(reason) = &card.reason {
        lines.push(field_line("Reason", reason));
    }
    match card.state {
        ConfirmationState::ApprovalRequested => {
            lines.push(footer_line(&["ctrl+y approve", "ctrl+r deny"]));
        }
        ConfirmationState::ApprovalResponded => {
            let verdict = if card.approved == Some(true) {
                "Approved, running…"
            } else {
                "Denied, waiting for the hub…"
            };
            lines.push(badge_line(verdict, Style::ToolRunning));
            lines.push(footer_line(&[]));
        }
        ConfirmationState::OutputAvailable => {
            lines.push(badge_line("✓ Completed", Style::CardDone));
            lines.push(footer_line(&[]));
        }
        ConfirmationState::OutputDenied => {
            lines.push(badge_line("Denied", Style::CardMuted));
            lines.push(footer_line(&[]));
        }
    }
    lines
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
    fn pending_approval_offers_both_choices() {
        let ctx = RenderContext::new(80);
        let text = combined(&render_confirmation(
            &ctx,
            &json!({ "toolName": "delete_workspace", "state": "approval-requested" }),
        ));
        assert!(text.contains("delete_workspace"));
        assert!(text.contains("ctrl+y approve"));
        assert!(text.contains("ctrl+r deny"));
    }

    #[test]
    fn denied_outcome_is_terminal() {
        let ctx = RenderContext::new(80);
        let text = combined(&render_confirmation(
            &ctx,
            &json!({ "toolName": "x", "state": "output-denied" }),
        ));
        assert!(text.contains("Denied"));
        assert!(!text.contains("ctrl+y"));
    }
}
