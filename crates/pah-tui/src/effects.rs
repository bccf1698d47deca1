//! Effects returned by the reducer for the runtime to execute.
//!
//! The reducer only mutates state; everything that touches IO or
//! spawns a task comes back as one of these.

use pah_core::components::ComponentAction;

#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,
    /// Start a chat turn over the feed's current history.
    StartChatTurn,
    /// Cancel the in-flight chat turn.
    InterruptChat,
    /// Post a component action to the hub's callback endpoint.
    DispatchAction(ComponentAction),
    /// Persist the composer draft.
    SaveDraft { text: String },
}
