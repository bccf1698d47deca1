//! Server-push client integration tests against a mock hub.


use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer};

use pah_core::feed::Feed;
use pah_core::push::store::EventStore;
use pah_core::push::{PushConfig, PushUpdate, spawn_push_client};

fn push_config(server: &MockServer) -> PushConfig {
    let url = format!("{}/api/v1/agent/events", server.uri())
        .parse()
        .unwrap();
    PushConfig {
        events_url: url,
        reconnect_delay: Duration::from_millis(50),
    }
}

#[tokio::test]
async fn named_events_arrive_after_connect() {
    let server = MockServer::start().await;
    let body = fixtures::push_frame(
        "conversation_invite",
        r#"{"message":"Kettle has something for you"}"#,
    );
    Mock::given(method("GET"))
        .and(path("/api/v1/agent/events"))
        .and(header("Accept", "text/event-stream"))
        .respond_with(fixtures::sse_response(&body))
        .mount(&server)
        .await;

    let (mut rx, cancel) = spawn_push_client(reqwest::Client::new(), push_config(&server));

    assert_eq!(rx.recv().await, Some(PushUpdate::Connected));
    let Some(PushUpdate::Event(event)) = rx.recv().await else {
        panic!("expected a push event");
    };
    assert_eq!(event.event_type, "conversation_invite");
    assert_eq!(event.data["message"], "Kettle has something for you");

    cancel.cancel();
}

#[tokio::test]
async fn dropped_stream_reports_disconnect_then_reconnects() {
    let server = MockServer::start().await;
    let body = fixtures::push_frame("url_summary_complete", r#"{"title":"Rust Book"}"#);
    Mock::given(method("GET"))
        .and(path("/api/v1/agent/events"))
        .respond_with(fixtures::sse_response(&body))
        .mount(&server)
        .await;

    let (mut rx, cancel) = spawn_push_client(reqwest::Client::new(), push_config(&server));
    let mut store = EventStore::new();

    // First connection: connect, one event, then the body ends and the
    // client reports the drop.
    let mut saw_disconnect = false;
    let mut reconnected = false;
    while let Some(update) = rx.recv().await {
        store.apply(&update);
        match update {
            PushUpdate::Disconnected { .. } => saw_disconnect = true,
            PushUpdate::Connected if saw_disconnect => {
                reconnected = true;
                break;
            }
            _ => {}
        }
    }
    assert!(saw_disconnect);
    assert!(reconnected);
    assert!(store.is_connected());
    assert!(!store.is_empty());

    cancel.cancel();
}

#[tokio::test]
async fn feed_ingests_each_push_event_once() {
    let server = MockServer::start().await;
    let body = fixtures::push_frame(
        "url_summary_complete",
        r#"{"message":"Summary ready","resource":{"url":"https://doc.rust-lang.org","title":"Rust Book","summary":"Ownership explained."}}"#,
    );
    Mock::given(method("GET"))
        .and(path("/api/v1/agent/events"))
        .respond_with(fixtures::sse_response(&body))
        .mount(&server)
        .await;

    let (mut rx, cancel) = spawn_push_client(reqwest::Client::new(), push_config(&server));

    assert_eq!(rx.recv().await, Some(PushUpdate::Connected));
    let Some(PushUpdate::Event(event)) = rx.recv().await else {
        panic!("expected a push event");
    };
    cancel.cancel();

    let mut feed = Feed::new();
    assert!(feed.ingest_push_event(&event));
    assert!(!feed.ingest_push_event(&event));
    assert_eq!(feed.messages().len(), 1);
    let text = feed.messages()[0].text_content();
    assert!(text.contains("Summary ready"));
    assert!(text.contains("Rust Book"));
}

#[tokio::test]
async fn cancellation_stops_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/agent/events"))
        .respond_with(fixtures::sse_response(""))
        .mount(&server)
        .await;

    let (mut rx, cancel) = spawn_push_client(reqwest::Client::new(), push_config(&server));
    assert_eq!(rx.recv().await, Some(PushUpdate::Connected));
    cancel.cancel();

    // The task exits instead of reconnecting; the channel drains and
    // closes.
    let mut remaining = 0;
    while rx.recv().await.is_some() {
        remaining += 1;
        assert!(remaining < 10, "client kept sending after cancellation");
    }
}
