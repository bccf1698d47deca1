//! Message and part model for the chat feed.
//!
//! A [`Message`] is an ordered list of [`MessagePart`]s. Parts arrive
//! incrementally over the wire and are appended as observed; the
//! reconciliation in [`crate::dedup`] collapses repeated tool-call
//! snapshots at render time instead of mutating history in place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::components::{
    LearningSession, LogDraftData, LogDraftState, NewsItem, QuizQuestion, ResourcePreviewData,
    ResourceState, TimelineTask, TimesheetEntry, TimesheetState, Workspace,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl Message {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            parts: Vec::new(),
        }
    }

    pub fn text(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            parts: vec![MessagePart::Text {
                content: content.into(),
            }],
        }
    }

    /// Concatenated text content of the message's text parts.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let MessagePart::Text { content } = part {
                out.push_str(content);
            }
        }
        out
    }
}

/// Lifecycle of a tool call as streamed by the hub.
///
/// States form a total order; a later snapshot may only advance it.
/// `OutputAvailable` and `OutputError` are both terminal and rank
/// equal, so whichever the hub reports last wins the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCallState {
    InputStreaming,
    InputAvailable,
    OutputAvailable,
    OutputError,
}

impl ToolCallState {
    pub fn rank(self) -> u8 {
        match self {
            Self::InputStreaming => 0,
            Self::InputAvailable => 1,
            Self::OutputAvailable | Self::OutputError => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationState {
    ApprovalRequested,
    ApprovalResponded,
    OutputAvailable,
    OutputDenied,
}

/// One unit of assistant (or user) output inside a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum MessagePart {
    Text {
        content: String,
    },
    Reasoning {
        content: String,
        #[serde(default)]
        is_streaming: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
    },
    Tool {
        tool_call_id: String,
        tool_name: String,
        #[serde(default)]
        input: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_text: Option<String>,
        state: ToolCallState,
    },
    File {
        media_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Confirmation {
        tool_name: String,
        state: ConfirmationState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        approved: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    #[serde(rename = "pah-log-draft-card")]
    LogDraftCard {
        #[serde(default)]
        default_values: LogDraftData,
        #[serde(default)]
        workspaces: Vec<Workspace>,
        #[serde(default)]
        suggested_tags: Vec<String>,
        #[serde(default)]
        state: LogDraftState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_message: Option<String>,
    },
    #[serde(rename = "pah-timesheet-form")]
    TimesheetForm {
        #[serde(default)]
        default_values: TimesheetEntry,
        #[serde(default)]
        state: TimesheetState,
    },
    #[serde(rename = "pah-daily-summary")]
    DailySummary {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
        #[serde(default)]
        tasks: Vec<TimelineTask>,
    },
    #[serde(rename = "pah-resource-preview")]
    ResourcePreview {
        #[serde(default)]
        data: ResourcePreviewData,
        #[serde(default)]
        state: ResourceState,
    },
    #[serde(rename = "pah-news-digest")]
    NewsDigest {
        #[serde(default)]
        items: Vec<NewsItem>,
    },
    #[serde(rename = "pah-learning-plan")]
    LearningPlan {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
        #[serde(default)]
        sessions: Vec<LearningSession>,
    },
    #[serde(rename = "pah-quiz")]
    Quiz {
        #[serde(default)]
        questions: Vec<QuizQuestion>,
    },
}

impl MessagePart {
    /// Registry identifier the renderer dispatches on.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Reasoning { .. } => "reasoning",
            Self::Tool { .. } => "tool",
            Self::File { .. } => "file",
            Self::Confirmation { .. } => "confirmation",
            Self::LogDraftCard { .. } => "pah-log-draft-card",
            Self::TimesheetForm { .. } => "pah-timesheet-form",
            Self::DailySummary { .. } => "pah-daily-summary",
            Self::ResourcePreview { .. } => "pah-resource-preview",
            Self::NewsDigest { .. } => "pah-news-digest",
            Self::LearningPlan { .. } => "pah-learning-plan",
            Self::Quiz { .. } => "pah-quiz",
        }
    }
}
