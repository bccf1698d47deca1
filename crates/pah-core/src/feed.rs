//! The message feed: ordered conversation state and the rules for
//! mutating it.
//!
//! All mutation funnels through two entry points: [`Feed::apply_chat_event`]
//! for the streaming turn and [`Feed::ingest_push_event`] for server-push
//! notifications. Rendering reads the feed; it never writes it.

use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use crate::events::ChatEvent;
use crate::parts::{Message, MessagePart, Role};
use crate::push::SseEvent;

/// Where the active turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    /// A user message was sent; nothing has streamed back yet.
    Submitted,
    /// Assistant output is streaming.
    Streaming,
}

#[derive(Debug, Default)]
pub struct Feed {
    messages: Vec<Message>,
    phase: TurnPhase,
    /// Ids of push events already turned into feed messages.
    seen_push_ids: HashSet<String>,
    /// A text part is open and trailing deltas append to it.
    text_open: bool,
    reasoning_open: bool,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != TurnPhase::Idle
    }

    /// Appends the user's message and marks the turn submitted.
    pub fn push_user_message(&mut self, content: impl Into<String>) -> &Message {
        let message = Message::text(Uuid::new_v4().to_string(), Role::User, content);
        self.messages.push(message);
        self.phase = TurnPhase::Submitted;
        self.text_open = false;
        self.reasoning_open = false;
        self.messages.last().unwrap_or_else(|| unreachable!())
    }

    /// Applies one streaming event to the feed.
    pub fn apply_chat_event(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::TurnStarted { message_id } => {
                self.messages
                    .push(Message::new(message_id.clone(), Role::Assistant));
                self.phase = TurnPhase::Streaming;
                self.text_open = false;
                self.reasoning_open = false;
            }
            ChatEvent::TextDelta { text } => {
                self.append_text_delta(text);
            }
            ChatEvent::TextCompleted => {
                self.text_open = false;
            }
            ChatEvent::ReasoningDelta { text } => {
                self.append_reasoning_delta(text);
            }
            ChatEvent::ReasoningCompleted { duration } => {
                self.close_reasoning(*duration);
            }
            ChatEvent::PartAdded { part } => {
                self.text_open = false;
                self.current_turn().parts.push(part.clone());
            }
            ChatEvent::TurnCompleted | ChatEvent::Interrupted => {
                self.finish_turn();
            }
            ChatEvent::Error { kind, message } => {
                debug!(?kind, message, "turn ended with error");
                self.finish_turn();
            }
        }
    }

    /// Ingests one server-push event, at most once per event identity.
    ///
    /// Only events that carry user-facing text become feed messages;
    /// everything else belongs to the event store. Returns whether a
    /// message was added.
    pub fn ingest_push_event(&mut self, event: &SseEvent) -> bool {
        let Some(content) = synthesize_push_text(event) else {
            return false;
        };
        let id = event.dedup_id();
        if !self.seen_push_ids.insert(id.clone()) {
            return false;
        }
        self.messages
            .push(Message::text(id, Role::Assistant, content));
        true
    }

    fn append_text_delta(&mut self, delta: &str) {
        let open = self.text_open;
        let message = self.current_turn();
        if open {
            if let Some(MessagePart::Text { content }) = message.parts.last_mut() {
                content.push_str(delta);
                return;
            }
        }
        message.parts.push(MessagePart::Text {
            content: delta.to_owned(),
        });
        self.text_open = true;
    }

    fn append_reasoning_delta(&mut self, delta: &str) {
        let open = self.reasoning_open;
        let message = self.current_turn();
        if open {
            if let Some(MessagePart::Reasoning { content, .. }) = message.parts.last_mut() {
                content.push_str(delta);
                return;
            }
        }
        message.parts.push(MessagePart::Reasoning {
            content: delta.to_owned(),
            is_streaming: true,
            duration: None,
        });
        self.reasoning_open = true;
    }

    fn close_reasoning(&mut self, elapsed: Option<f64>) {
        if !self.reasoning_open {
            return;
        }
        self.reasoning_open = false;
        if let Some(message) = self.messages.last_mut() {
            for part in message.parts.iter_mut().rev() {
                if let MessagePart::Reasoning {
                    is_streaming,
                    duration,
                    ..
                } = part
                {
                    *is_streaming = false;
                    *duration = elapsed;
                    break;
                }
            }
        }
    }

    fn finish_turn(&mut self) {
        // Freeze any reasoning still marked streaming.
        self.close_reasoning(None);
        self.phase = TurnPhase::Idle;
        self.text_open = false;
    }

    /// The assistant message of the active turn, created on demand when
    /// a delta beats the start frame.
    fn current_turn(&mut self) -> &mut Message {
        let needs_message = self.phase != TurnPhase::Streaming
            || !matches!(
                self.messages.last(),
                Some(m) if m.role == Role::Assistant
            );
        if needs_message {
            self.messages
                .push(Message::new(Uuid::new_v4().to_string(), Role::Assistant));
            self.phase = TurnPhase::Streaming;
        }
        self.messages.last_mut().unwrap_or_else(|| unreachable!())
    }
}

/// Builds the synthetic assistant text for a push event, if it has any.
fn synthesize_push_text(event: &SseEvent) -> Option<String> {
    match event.event_type.as_str() {
        "conversation_invite" => event
            .data
            .get("message")
            .and_then(|v| v.as_str())
            .map(str::to_owned),
        "url_summary_complete" => {
            let message = event
                .data
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Resource saved");
            // Title and summary live under the event's `resource` object.
            let resource = event.data.get("resource");
            let title = resource
                .and_then(|r| r.get("title"))
                .and_then(|v| v.as_str())
                .filter(|t| !t.is_empty())
                .unwrap_or("Resource");
            let summary = resource
                .and_then(|r| r.get("summary"))
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Some(format!("✅ **{message}**\n\n📄 **{title}**\n\n{summary}"))
        }
        _ => None,
    }
}
