//! Server-push client: a long-lived SSE subscription to the hub.
//!
//! The client task connects to the hub's event stream, forwards every
//! decoded event plus connection transitions over a channel, and
//! reconnects after a fixed delay whenever the stream drops. The
//! receiving side owns all state; the task holds none beyond the
//! connection itself.

pub mod store;

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::{TransportError, TransportResult};

/// Delay between reconnect attempts once a stream drops.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// One decoded server-push event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Named SSE event, or `"message"` for unnamed frames.
    pub event_type: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl SseEvent {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Stable identity used to ingest each push event exactly once.
    pub fn dedup_id(&self) -> String {
        format!(
            "sse-{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

/// Connection transitions and events reported by the client task.
#[derive(Debug, Clone, PartialEq)]
pub enum PushUpdate {
    Connected,
    Disconnected { error: String },
    Event(SseEvent),
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub events_url: Url,
    pub reconnect_delay: Duration,
}

impl PushConfig {
    pub fn new(events_url: Url) -> Self {
        Self {
            events_url,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// Spawns the push client task.
///
/// The task runs until the returned token is cancelled. Dropping the
/// receiver also stops it on the next send.
pub fn spawn_push_client(
    http: reqwest::Client,
    config: PushConfig,
) -> (mpsc::UnboundedReceiver<PushUpdate>, CancellationToken) {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        run_push_client(http, config, tx, token).await;
    });
    (rx, cancel)
}

async fn run_push_client(
    http: reqwest::Client,
    config: PushConfig,
    tx: mpsc::UnboundedSender<PushUpdate>,
    cancel: CancellationToken,
) {
    loop {
        let attempt = tokio::select! {
            () = cancel.cancelled() => return,
            result = stream_events(&http, &config.events_url, &tx, &cancel) => result,
        };
        match attempt {
            Ok(()) => return,
            Err(err) => {
                debug!(error = %err, "push stream dropped");
                if tx
                    .send(PushUpdate::Disconnected {
                        error: err.message,
                    })
                    .is_err()
                {
                    return;
                }
            }
        }
        // Fixed backoff; cancellation aborts the pending reconnect.
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
}

/// Runs one connection until it drops. `Ok(())` means the receiver went
/// away and the task should stop rather than reconnect.
async fn stream_events(
    http: &reqwest::Client,
    url: &Url,
    tx: &mpsc::UnboundedSender<PushUpdate>,
    cancel: &CancellationToken,
) -> TransportResult<()> {
    let response = http
        .get(url.clone())
        .header("Accept", "text/event-stream")
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::http_status(status, &body));
    }
    if tx.send(PushUpdate::Connected).is_err() {
        return Ok(());
    }

    let mut stream = response.bytes_stream().eventsource();
    loop {
        let item = tokio::select! {
            () = cancel.cancelled() => return Ok(()),
            item = stream.next() => item,
        };
        match item {
            Some(Ok(frame)) => {
                if let Some(event) = decode_frame(&frame.event, &frame.data) {
                    if tx.send(PushUpdate::Event(event)).is_err() {
                        return Ok(());
                    }
                }
            }
            Some(Err(err)) => return Err(TransportError::parse(err.to_string())),
            None => return Err(TransportError::parse("event stream closed")),
        }
    }
}

/// Decodes one SSE frame. Unnamed frames are typed by the payload's
/// own `type` field, falling back to `"message"`; malformed JSON
/// payloads are logged and skipped.
fn decode_frame(event_name: &str, data: &str) -> Option<SseEvent> {
    let payload: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(err) => {
            warn!(event = event_name, error = %err, "skipping malformed push event");
            return None;
        }
    };
    let event_type = if event_name.is_empty() {
        payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("message")
            .to_owned()
    } else {
        event_name.to_owned()
    };
    Some(SseEvent::new(event_type, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_frame_keeps_its_event_type() {
        let event = decode_frame("conversation_invite", r#"{"message":"hi"}"#).unwrap();
        assert_eq!(event.event_type, "conversation_invite");
        assert_eq!(event.data["message"], "hi");
    }

    #[test]
    fn unnamed_frame_takes_the_payload_type() {
        let event = decode_frame("", r#"{"type":"url_summary_complete","status":"completed"}"#)
            .unwrap();
        assert_eq!(event.event_type, "url_summary_complete");
    }

    #[test]
    fn unnamed_untyped_frame_defaults_to_message() {
        let event = decode_frame("", r#"{"ping":true}"#).unwrap();
        assert_eq!(event.event_type, "message");
    }

    #[test]
    fn malformed_payload_is_skipped() {
        assert!(decode_frame("message", "not json").is_none());
    }

    #[test]
    fn dedup_id_is_stable_for_a_given_timestamp() {
        let mut event = SseEvent::new("message", Value::Null);
        event.timestamp = DateTime::parse_from_rfc3339("2026-08-28T12:00:00.125Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(event.dedup_id(), "sse-2026-08-28T12:00:00.125Z");
    }
}
