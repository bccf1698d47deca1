//! Events emitted by the chat transport while a turn streams.

use crate::error::TransportErrorKind;
use crate::parts::MessagePart;

/// One decoded step of an assistant turn.
///
/// The transport task translates wire frames into these and sends them
/// over a channel; the feed applies them in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// The hub accepted the turn and assigned the assistant message id.
    TurnStarted { message_id: String },
    /// Incremental assistant text.
    TextDelta { text: String },
    /// The current text part is complete.
    TextCompleted,
    /// Incremental reasoning text.
    ReasoningDelta { text: String },
    /// The current reasoning part is complete.
    ReasoningCompleted { duration: Option<f64> },
    /// A structured part arrived whole (tool snapshots, cards, files).
    PartAdded { part: MessagePart },
    /// The turn finished normally.
    TurnCompleted,
    /// The user cancelled the turn mid-stream.
    Interrupted,
    /// The stream failed; the turn is over.
    Error {
        kind: TransportErrorKind,
        message: String,
    },
}
