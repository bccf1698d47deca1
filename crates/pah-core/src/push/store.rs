//! Bounded in-memory log of server-push events.

use std::collections::VecDeque;

use super::{PushUpdate, SseEvent};

/// Newest events the store retains; older ones are evicted in order.
pub const MAX_EVENTS: usize = 100;

/// Connection status plus a bounded FIFO of received events.
///
/// Owned by whoever drains the push channel; the store itself does no
/// locking or IO.
#[derive(Debug, Default)]
pub struct EventStore {
    connected: bool,
    connection_error: Option<String>,
    events: VecDeque<SseEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one update from the push client.
    pub fn apply(&mut self, update: &PushUpdate) {
        match update {
            PushUpdate::Connected => {
                self.connected = true;
                self.connection_error = None;
            }
            PushUpdate::Disconnected { error } => {
                self.connected = false;
                self.connection_error = Some(error.clone());
            }
            PushUpdate::Event(event) => self.record(event.clone()),
        }
    }

    fn record(&mut self, event: SseEvent) {
        if self.events.len() == MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn connection_error(&self) -> Option<&str> {
        self.connection_error.as_deref()
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &SseEvent> {
        self.events.iter()
    }

    /// Retained events of one type, oldest first.
    pub fn events_of_type<'a>(
        &'a self,
        event_type: &'a str,
    ) -> impl Iterator<Item = &'a SseEvent> {
        self.events
            .iter()
            .filter(move |event| event.event_type == event_type)
    }

    /// Drops the event log. Connection state is untouched; nothing
    /// else ever shrinks the log.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn latest(&self) -> Option<&SseEvent> {
        self.events.back()
    }
}
