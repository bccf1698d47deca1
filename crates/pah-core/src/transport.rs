//! Chat transport: posts a turn to the hub and decodes the SSE reply.
//!
//! The hub streams a turn as `data:` JSON frames terminated by
//! `data: [DONE]`. Each frame is tagged with a `type`; the decoder
//! translates frames into [`ChatEvent`]s, tracking per-call tool names
//! and inputs so later snapshots stay self-contained.

use std::collections::HashMap;
use std::time::Instant;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{TransportError, TransportErrorKind};
use crate::events::ChatEvent;
use crate::parts::{Message, MessagePart, ToolCallState};

const DONE_SENTINEL: &str = "[DONE]";
const RATE_LIMIT_MESSAGE: &str = "Too many requests. Please try again later.";

/// Client for the hub's chat endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    chat_url: Url,
    /// Stable conversation id sent with every turn.
    chat_id: String,
}

impl ChatClient {
    pub fn new(http: reqwest::Client, chat_url: Url) -> Self {
        Self {
            http,
            chat_url,
            chat_id: Uuid::new_v4().to_string(),
        }
    }

    /// Starts one assistant turn over the given history.
    ///
    /// Events arrive on the returned channel until the turn ends; the
    /// token cancels the stream and yields [`ChatEvent::Interrupted`].
    pub fn start_turn(
        &self,
        messages: &[Message],
    ) -> (mpsc::Receiver<ChatEvent>, CancellationToken) {
        let (tx, rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let http = self.http.clone();
        let url = self.chat_url.clone();
        let body = request_body(&self.chat_id, messages);
        tokio::spawn(async move {
            if let Err(err) = run_turn(http, url, body, &tx, token).await {
                let _ = tx
                    .send(ChatEvent::Error {
                        kind: err.kind,
                        message: err.message,
                    })
                    .await;
            }
        });
        (rx, cancel)
    }
}

/// Serializes the conversation the way the hub expects: one text part
/// per message, structured parts elided.
fn request_body(chat_id: &str, messages: &[Message]) -> Value {
    let history: Vec<Value> = messages
        .iter()
        .map(|message| {
            json!({
                "id": message.id,
                "role": message.role,
                "parts": [{ "type": "text", "text": message.text_content() }],
            })
        })
        .collect();
    json!({ "id": chat_id, "messages": history })
}

async fn run_turn(
    http: reqwest::Client,
    url: Url,
    body: Value,
    tx: &mpsc::Sender<ChatEvent>,
    cancel: CancellationToken,
) -> Result<(), TransportError> {
    let response = http.post(url).json(&body).send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(TransportError::api(RATE_LIMIT_MESSAGE));
    }
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(TransportError::http_status(status, &text));
    }

    let mut stream = response.bytes_stream().eventsource();
    let mut decoder = FrameDecoder::default();
    // A stream that drops before its finish frame must still end the
    // turn, or the feed stays busy forever.
    let mut completed = false;
    loop {
        let item = tokio::select! {
            () = cancel.cancelled() => {
                let _ = tx.send(ChatEvent::Interrupted).await;
                return Ok(());
            }
            item = stream.next() => item,
        };
        match item {
            Some(Ok(frame)) => {
                if frame.data.trim() == DONE_SENTINEL {
                    break;
                }
                for event in decoder.decode(&frame.data) {
                    if matches!(event, ChatEvent::TurnCompleted) {
                        completed = true;
                    }
                    if tx.send(event).await.is_err() {
                        return Ok(());
                    }
                }
            }
            Some(Err(err)) => {
                return Err(TransportError::parse(err.to_string()));
            }
            None => break,
        }
    }
    if !completed {
        let _ = tx.send(ChatEvent::TurnCompleted).await;
    }
    Ok(())
}

/// Wire frames inside the chat SSE stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
enum WireFrame {
    Start {
        message_id: String,
    },
    TextStart {},
    TextDelta {
        delta: String,
    },
    TextEnd {},
    ReasoningStart {},
    ReasoningDelta {
        delta: String,
    },
    ReasoningEnd {},
    ToolInputStart {
        tool_call_id: String,
        tool_name: String,
    },
    ToolInputDelta {
        tool_call_id: String,
        input_text_delta: String,
    },
    ToolInputAvailable {
        tool_call_id: String,
        tool_name: String,
        input: Value,
    },
    ToolOutputAvailable {
        tool_call_id: String,
        output: Value,
    },
    ToolOutputError {
        tool_call_id: String,
        error_text: String,
    },
    Finish {},
    Error {
        // The hub sends `error`; some providers spell it `errorText`.
        #[serde(default, alias = "error")]
        error_text: Option<String>,
    },
}

/// Translates wire frames into chat events.
///
/// Output frames only carry the call id, so the decoder remembers each
/// call's name and latest input and stitches them into every snapshot.
#[derive(Debug, Default)]
struct FrameDecoder {
    tool_names: HashMap<String, String>,
    tool_inputs: HashMap<String, Value>,
    partial_inputs: HashMap<String, String>,
    reasoning_started: Option<Instant>,
}

impl FrameDecoder {
    fn decode(&mut self, data: &str) -> Vec<ChatEvent> {
        let frame: WireFrame = match serde_json::from_str(data) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "skipping undecodable chat frame");
                return Vec::new();
            }
        };
        match frame {
            WireFrame::Start { message_id } => {
                vec![ChatEvent::TurnStarted { message_id }]
            }
            WireFrame::TextStart {} => Vec::new(),
            WireFrame::TextDelta { delta } => vec![ChatEvent::TextDelta { text: delta }],
            WireFrame::TextEnd {} => vec![ChatEvent::TextCompleted],
            WireFrame::ReasoningStart {} => {
                self.reasoning_started = Some(Instant::now());
                Vec::new()
            }
            WireFrame::ReasoningDelta { delta } => {
                if self.reasoning_started.is_none() {
                    self.reasoning_started = Some(Instant::now());
                }
                vec![ChatEvent::ReasoningDelta { text: delta }]
            }
            WireFrame::ReasoningEnd {} => {
                let duration = self
                    .reasoning_started
                    .take()
                    .map(|start| start.elapsed().as_secs_f64());
                vec![ChatEvent::ReasoningCompleted { duration }]
            }
            WireFrame::ToolInputStart {
                tool_call_id,
                tool_name,
            } => {
                self.tool_names
                    .insert(tool_call_id.clone(), tool_name.clone());
                vec![self.tool_snapshot(&tool_call_id, ToolCallState::InputStreaming, None, None)]
            }
            WireFrame::ToolInputDelta {
                tool_call_id,
                input_text_delta,
            } => {
                let partial = self.partial_inputs.entry(tool_call_id.clone()).or_default();
                partial.push_str(&input_text_delta);
                // Partial JSON rarely parses; fall back to the raw text.
                let input = serde_json::from_str(partial)
                    .unwrap_or_else(|_| Value::String(partial.clone()));
                self.tool_inputs.insert(tool_call_id.clone(), input);
                vec![self.tool_snapshot(&tool_call_id, ToolCallState::InputStreaming, None, None)]
            }
            WireFrame::ToolInputAvailable {
                tool_call_id,
                tool_name,
                input,
            } => {
                self.tool_names
                    .insert(tool_call_id.clone(), tool_name.clone());
                self.tool_inputs.insert(tool_call_id.clone(), input);
                self.partial_inputs.remove(&tool_call_id);
                vec![self.tool_snapshot(&tool_call_id, ToolCallState::InputAvailable, None, None)]
            }
            WireFrame::ToolOutputAvailable {
                tool_call_id,
                output,
            } => {
                vec![self.tool_snapshot(
                    &tool_call_id,
                    ToolCallState::OutputAvailable,
                    Some(output),
                    None,
                )]
            }
            WireFrame::ToolOutputError {
                tool_call_id,
                error_text,
            } => {
                vec![self.tool_snapshot(
                    &tool_call_id,
                    ToolCallState::OutputError,
                    None,
                    Some(error_text),
                )]
            }
            WireFrame::Finish {} => vec![ChatEvent::TurnCompleted],
            WireFrame::Error { error_text } => {
                let message = error_text.unwrap_or_else(|| "hub reported an error".into());
                debug!(message, "error frame in chat stream");
                vec![ChatEvent::Error {
                    kind: TransportErrorKind::ApiError,
                    message,
                }]
            }
        }
    }

    fn tool_snapshot(
        &self,
        tool_call_id: &str,
        state: ToolCallState,
        output: Option<Value>,
        error_text: Option<String>,
    ) -> ChatEvent {
        ChatEvent::PartAdded {
            part: MessagePart::Tool {
                tool_call_id: tool_call_id.to_owned(),
                tool_name: self
                    .tool_names
                    .get(tool_call_id)
                    .cloned()
                    .unwrap_or_default(),
                input: self
                    .tool_inputs
                    .get(tool_call_id)
                    .cloned()
                    .unwrap_or(Value::Null),
                output,
                error_text,
                state,
            },
        }
    }
}
