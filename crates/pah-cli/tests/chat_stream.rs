//! Chat transport integration tests against a mock hub.


use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pah_core::events::ChatEvent;
use pah_core::feed::Feed;
use pah_core::parts::{Message, MessagePart, Role, ToolCallState};
use pah_core::transport::ChatClient;

async fn collect_events(mut rx: tokio::sync::mpsc::Receiver<ChatEvent>) -> Vec<ChatEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let done = matches!(
            event,
            ChatEvent::TurnCompleted | ChatEvent::Interrupted | ChatEvent::Error { .. }
        );
        events.push(event);
        if done {
            break;
        }
    }
    events
}

fn chat_client(server: &MockServer) -> ChatClient {
    let url = format!("{}/api/v1/agent/chat", server.uri()).parse().unwrap();
    ChatClient::new(reqwest::Client::new(), url)
}

#[tokio::test]
async fn text_turn_streams_deltas_and_completes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/agent/chat"))
        .respond_with(fixtures::sse_response(&fixtures::text_sse(
            "msg_1",
            "Hello from the hub",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = chat_client(&server);
    let history = vec![Message::text("u1", Role::User, "hi")];
    let (rx, _cancel) = client.start_turn(&history);
    let events = collect_events(rx).await;

    assert_eq!(
        events.first(),
        Some(&ChatEvent::TurnStarted {
            message_id: "msg_1".into()
        })
    );
    assert!(events.contains(&ChatEvent::TextDelta {
        text: "Hello from the hub".into()
    }));
    assert_eq!(events.last(), Some(&ChatEvent::TurnCompleted));
}

#[tokio::test]
async fn request_carries_the_flattened_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/agent/chat"))
        .and(body_partial_json(serde_json::json!({
            "messages": [
                { "role": "user", "parts": [{ "type": "text", "text": "log 30m" }] }
            ]
        })))
        .respond_with(fixtures::sse_response(&fixtures::text_sse("msg_1", "ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = chat_client(&server);
    let history = vec![Message::text("u1", Role::User, "log 30m")];
    let (rx, _cancel) = client.start_turn(&history);
    collect_events(rx).await;
}

#[tokio::test]
async fn card_turn_lands_in_the_feed_as_a_terminal_tool_part() {
    let server = MockServer::start().await;
    let output = r#"{"defaultValues":{"taskContent":"Wrote tests","duration":30},"state":"editing"}"#;
    Mock::given(method("POST"))
        .and(path("/api/v1/agent/chat"))
        .respond_with(fixtures::sse_response(&fixtures::card_sse(
            "msg_1",
            "call_1",
            "pah-log-draft-card",
            output,
        )))
        .mount(&server)
        .await;

    let client = chat_client(&server);
    let mut feed = Feed::new();
    feed.push_user_message("log my work");
    let (rx, _cancel) = client.start_turn(feed.messages());
    for event in collect_events(rx).await {
        feed.apply_chat_event(&event);
    }

    assert!(!feed.is_busy());
    let assistant = feed.messages().last().unwrap();
    let terminal_tool = assistant.parts.iter().rev().find_map(|part| match part {
        MessagePart::Tool {
            tool_name,
            output,
            state,
            ..
        } if *state == ToolCallState::OutputAvailable => Some((tool_name, output)),
        _ => None,
    });
    let (tool_name, output) = terminal_tool.expect("expected a terminal tool part");
    assert_eq!(tool_name, "pah-log-draft-card");
    assert_eq!(
        output.as_ref().unwrap()["defaultValues"]["taskContent"],
        "Wrote tests"
    );
}

#[tokio::test]
async fn rate_limit_maps_to_a_friendly_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/agent/chat"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = chat_client(&server);
    let history = vec![Message::text("u1", Role::User, "hi")];
    let (rx, _cancel) = client.start_turn(&history);
    let events = collect_events(rx).await;

    let ChatEvent::Error { message, .. } = events.last().unwrap() else {
        panic!("expected an error event, got {events:?}");
    };
    assert_eq!(message, "Too many requests. Please try again later.");
}

#[tokio::test]
async fn truncated_stream_still_completes_the_turn() {
    let server = MockServer::start().await;
    // The body ends after the start frame, no finish and no [DONE].
    let body = "data: {\"type\":\"start\",\"messageId\":\"msg_1\"}\n\n";
    Mock::given(method("POST"))
        .and(path("/api/v1/agent/chat"))
        .respond_with(fixtures::sse_response(body))
        .mount(&server)
        .await;

    let client = chat_client(&server);
    let history = vec![Message::text("u1", Role::User, "hi")];
    let (mut rx, _cancel) = client.start_turn(&history);

    assert_eq!(
        rx.recv().await,
        Some(ChatEvent::TurnStarted {
            message_id: "msg_1".into()
        })
    );
    // A dropped connection must not leave the feed busy.
    assert_eq!(rx.recv().await, Some(ChatEvent::TurnCompleted));
    assert_eq!(rx.recv().await, None);
}
