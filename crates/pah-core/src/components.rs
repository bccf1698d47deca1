//! Payload types for the hub's interactive component cards.
//!
//! These mirror the JSON the hub's tools emit. Field names stay in
//! camelCase on the wire; everything tolerates missing fields so a
//! partially-streamed card still deserializes.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// Work-log draft card.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDraftData {
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub task_content: String,
    #[serde(default)]
    pub date: String,
    /// Duration in minutes.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Mood on a 1-5 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogDraftState {
    #[default]
    Editing,
    Saving,
    Saved,
    Cancelled,
}

// Timesheet form.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimesheetState {
    #[default]
    Input,
    Submitted,
    Confirmed,
}

// Daily summary timeline.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineTask {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_color: Option<String>,
    /// Duration in minutes.
    #[serde(default)]
    pub duration: u32,
    /// Wall-clock "HH:MM".
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

// Resource preview card.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePreviewData {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ai_summary: String,
    #[serde(default)]
    pub user_intent: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceState {
    #[default]
    Editing,
    Saving,
    Saved,
}

// News digest.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
    /// Relevance on a 0-100 scale.
    #[serde(default)]
    pub relevance_score: u8,
    #[serde(default)]
    pub source: String,
}

// Learning plan.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningSession {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub reason: String,
    /// Free-form, e.g. "15 mins".
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_domain: Option<String>,
}

// Quiz.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuizKind {
    #[default]
    MultipleChoice,
    FreeText,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: QuizKind,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<QuizOption>,
    /// Option id for multiple choice, answer keywords for free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_highlight: Option<String>,
}

impl QuizQuestion {
    /// Whether the option at `index` is the marked answer.
    pub fn is_correct_option(&self, index: usize) -> bool {
        match (self.options.get(index), &self.correct_answer) {
            (Some(option), Some(answer)) => option.id == *answer,
            _ => false,
        }
    }
}

/// Commands a rendered card can issue back to the hub.
///
/// Each variant maps onto one callback POST. The renderer builds these
/// from user input; the callback sink serializes them.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentAction {
    SaveLogDraft { draft: LogDraftData },
    CancelLogDraft,
    SubmitTimesheet { entry: TimesheetEntry },
    SaveResource { resource: ResourcePreviewData },
    ReadLaterResource { resource: ResourcePreviewData },
    BookmarkNews { item: NewsItem },
    DismissNews { item: NewsItem },
    RespondConfirmation { tool_name: String, approved: bool },
    StartLearningSession { session: LearningSession },
    FinishQuiz { results: Value },
}

impl ComponentAction {
    /// Action verb sent in the callback body.
    pub fn action(&self) -> &'static str {
        match self {
            Self::SaveLogDraft { .. } | Self::SaveResource { .. } => "save",
            Self::CancelLogDraft => "cancel",
            Self::SubmitTimesheet { .. } => "submit",
            Self::ReadLaterResource { .. } => "read_later",
            Self::BookmarkNews { .. } => "bookmark",
            Self::DismissNews { .. } => "dismiss",
            Self::RespondConfirmation { .. } => "respond",
            Self::StartLearningSession { .. } => "start_session",
            Self::FinishQuiz { .. } => "finish",
        }
    }

    /// Component identifier the hub uses to route the callback.
    pub fn component_type(&self) -> &'static str {
        match self {
            Self::SaveLogDraft { .. } | Self::CancelLogDraft => "log-draft-card",
            Self::SubmitTimesheet { .. } => "timesheet-form",
            Self::SaveResource { .. } | Self::ReadLaterResource { .. } => "resource-preview",
            Self::BookmarkNews { .. } | Self::DismissNews { .. } => "news-digest",
            Self::RespondConfirmation { .. } => "confirmation",
            Self::StartLearningSession { .. } => "learning-plan",
            Self::FinishQuiz { .. } => "quiz",
        }
    }

    /// Action payload serialized into the callback body.
    pub fn payload(&self) -> Value {
        match self {
            Self::SaveLogDraft { draft } => serde_json::to_value(draft).unwrap_or(Value::Null),
            Self::CancelLogDraft => Value::Null,
            Self::SubmitTimesheet { entry } => serde_json::to_value(entry).unwrap_or(Value::Null),
            // The hub only needs the identity of the resource.
            Self::SaveResource { resource } | Self::ReadLaterResource { resource } => {
                json!({ "url": resource.url, "title": resource.title })
            }
            Self::BookmarkNews { item } | Self::DismissNews { item } => {
                json!({ "id": item.id, "url": item.url, "title": item.title })
            }
            Self::RespondConfirmation {
                tool_name,
                approved,
            } => json!({ "toolName": tool_name, "approved": approved }),
            Self::StartLearningSession { session } => {
                serde_json::to_value(session).unwrap_or(Value::Null)
            }
            Self::FinishQuiz { results } => results.clone(),
        }
    }
}
