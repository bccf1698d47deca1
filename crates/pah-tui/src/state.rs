//! Application state composition.
//!
//! `TuiState` holds everything the reducer mutates: the feed and its
//! UI layer, the push event store, the composer, the status line, and
//! the active chat turn. The runtime owns the clients; state only sees
//! their channels.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use pah_core::events::ChatEvent;
use pah_core::feed::Feed;
use pah_core::push::store::EventStore;

use crate::features::cards::CardRegistry;
use crate::features::feed::FeedUiState;
use crate::features::input::InputState;
use crate::features::statusline::StatusState;

/// The in-flight chat turn, if any.
#[derive(Debug, Default)]
pub enum ChatTurn {
    #[default]
    Idle,
    Active {
        rx: mpsc::Receiver<ChatEvent>,
        cancel: CancellationToken,
    },
}

impl ChatTurn {
    pub fn is_active(&self) -> bool {
        matches!(self, ChatTurn::Active { .. })
    }
}

/// Scroll position of the feed viewport.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollState {
    /// Lines scrolled up from the bottom; 0 follows the stream.
    pub offset_from_bottom: usize,
}

impl ScrollState {
    pub fn scroll_up(&mut self, lines: usize, max: usize) {
        self.offset_from_bottom = (self.offset_from_bottom + lines).min(max);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_sub(lines);
    }

    pub fn jump_to_bottom(&mut self) {
        self.offset_from_bottom = 0;
    }
}

pub struct TuiState {
    pub feed: Feed,
    pub feed_ui: FeedUiState,
    pub registry: CardRegistry,
    pub events: EventStore,
    pub input: InputState,
    pub status: StatusState,
    pub chat: ChatTurn,
    pub scroll: ScrollState,
    pub spinner_frame: usize,
    /// Viewport size from the last frame.
    pub width: u16,
    pub height: u16,
    pub should_quit: bool,
}

impl TuiState {
    pub fn new(draft: Option<String>) -> Self {
        Self {
            feed: Feed::new(),
            feed_ui: FeedUiState::default(),
            registry: CardRegistry::with_defaults(),
            events: EventStore::new(),
            input: InputState::with_draft(draft),
            status: StatusState::new(),
            chat: ChatTurn::Idle,
            scroll: ScrollState::default(),
            spinner_frame: 0,
            width: 0,
            height: 0,
            should_quit: false,
        }
    }
}
