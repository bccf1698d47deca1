//! Work tracking cards: log draft, timesheet, daily summary.

use serde::Deserialize;
use serde_json::Value;

use pah_core::components::{
    LogDraftData, LogDraftState, TimelineTask, TimesheetEntry, TimesheetState, Workspace,
};

use super::{
    RenderContext, badge_line, field_line, footer_line, payload_as, title_line,
    wrapped_field_lines,
};
use crate::style::{Style, StyledLine};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogDraftPayload {
    #[serde(default)]
    default_values: LogDraftData,
    #[serde(default)]
    workspaces: Vec<Workspace>,
    #[serde(default)]
    suggested_tags: Vec<String>,
    #[serde(default)]
    state: LogDraftState,
    #[serde(default)]
    original_message: Option<String>,
}

pub(super) fn render_log_draft(ctx: &RenderContext, payload: &Value) -> Vec<StyledLine> {
    let card: LogDraftPayload = payload_as(payload);
    let draft = &card.default_values;

    let mut lines = vec![title_line("Work Log Draft")];
    if let Some(message) = &card.original_message {
        lines.extend(wrapped_field_lines(ctx.width, message, Style::Thinking));
    }
    let workspace = card
        .workspaces
        .iter()
        .find(|w| w.id == draft.workspace_id)
        .map_or(draft.workspace_id.as_str(), |w| w.name.as_str());
    lines.push(field_line("Workspace", workspace));
    lines.push(field_line("Task", &draft.task_content));
    lines.push(field_line("Date", &draft.date));
    lines.push(field_line("Duration", &format_minutes(draft.duration)));
    if !draft.tags.is_empty() {
        lines.push(field_line("Tags", &draft.tags.join(", ")));
    }
    if let Some(mood) = draft.mood {
        lines.push(field_line("Mood", &format!("{mood}/5")));
    }
    if !card.suggested_tags.is_empty() {
        lines.push(field_line("Suggested", &card.suggested_tags.join(", ")));
    }

    match card.state {
        LogDraftState::Editing => {
            lines.push(footer_line(&["ctrl+s save", "ctrl+x cancel"]));
        }
        LogDraftState::Saving => {
            lines.push(badge_line("Saving…", Style::ToolRunning));
            lines.push(footer_line(&[]));
        }
        LogDraftState::Saved => {
            lines.push(badge_line("✓ Saved", Style::CardDone));
            lines.push(footer_line(&[]));
        }
        LogDraftState::Cancelled => {
            lines.push(badge_line("Cancelled", Style::CardMuted));
            lines.push(footer_line(&[]));
        }
    }
    lines
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimesheetPayload {
    #[serde(default)]
    default_values: TimesheetEntry,
    #[serde(default)]
    state: TimesheetState,
}

pub(super) fn render_timesheet(_ctx: &RenderContext, payload: &Value) -> Vec<StyledLine> {
    let card: TimesheetPayload = payload_as(payload);
    let entry = &card.default_values;

    let mut lines = vec![
        title_line("Timesheet"),
        field_line("Date", &entry.date),
        field_line("Project", &entry.project),
        field_line("Task", &entry.task),
        field_line("Hours", &format!("{:.2}", entry.hours)),
    ];
    match card.state {
        TimesheetState::Input => lines.push(footer_line(&["ctrl+s submit"])),
        TimesheetState::Submitted => {
            lines.push(badge_line("Submitted, awaiting confirmation…", Style::ToolRunning));
            lines.push(footer_line(&[]));
        }
        TimesheetState::Confirmed => {
            lines.push(badge_line("✓ Confirmed", Style::CardDone));
            lines.push(footer_line(&[]));
        }
    }
    lines
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailySummaryPayload {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    tasks: Vec<TimelineTask>,
}

pub(super) fn render_daily_summary(ctx: &RenderContext, payload: &Value) -> Vec<StyledLine> {
    let card: DailySummaryPayload = payload_as(payload);

    let title = match &card.date {
        Some(date) => format!("Daily Summary · {date}"),
        None => "Daily Summary".to_string(),
    };
    let mut lines = vec![title_line(&title)];

    if card.tasks.is_empty() {
        lines.push(badge_line("No tracked work for this day.", Style::CardMuted));
    }
    let total: u32 = card.tasks.iter().map(|t| t.duration).sum();
    for task in &card.tasks {
        let mut entry = format!(
            "{}–{}  {} ({})",
            task.start_time,
            task.end_time,
            task.title,
            format_minutes(task.duration)
        );
        if !task.project_name.is_empty() {
            entry.push_str(&format!(" · {}", task.project_name));
        }
        lines.extend(wrapped_field_lines(ctx.width, &entry, Style::CardValue));
    }
    if !card.tasks.is_empty() {
        lines.push(field_line("Total", &format_minutes(total)));
    }
    lines.push(footer_line(&[]));
    lines
}

fn format_minutes(minutes: u32) -> String {
    if minutes >= 60 && minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}
