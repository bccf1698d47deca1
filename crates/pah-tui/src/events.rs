//! Events consumed by the reducer.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use pah_core::events::ChatEvent;
use pah_core::push::PushUpdate;

/// One unit of work for the reducer.
#[derive(Debug)]
pub enum UiEvent {
    /// Animation/timer tick.
    Tick,
    /// Terminal dimensions for the coming frame.
    Frame { width: u16, height: u16 },
    Terminal(crossterm::event::Event),
    /// A streaming event from the active chat turn.
    Chat(ChatEvent),
    /// The runtime spawned a chat turn; hand its channel to state.
    ChatSpawned {
        rx: mpsc::Receiver<ChatEvent>,
        cancel: CancellationToken,
    },
    /// Update from the server-push client.
    Push(PushUpdate),
}
