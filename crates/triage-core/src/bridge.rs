//! Direct-send seam.
//!
//! Widgets and shortcut handlers produce message text; the conversation
//! controller owns the history. `DirectSend` is the narrow interface
//! between the two, so a widget can never append to the history itself.

use crate::error::{Result, TriageError};
use crate::session::MessageId;
use async_trait::async_trait;

/// What happened to one accepted turn.
///
/// Both variants mean exactly one user message and exactly one bot message
/// were appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The service replied.
    Answered { user: MessageId, reply: MessageId },
    /// The call failed and an apology was appended instead.
    Degraded {
        user: MessageId,
        apology: MessageId,
        error: TriageError,
    },
}

impl TurnOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }

    /// Id of the bot message appended by this turn.
    pub fn bot_message_id(&self) -> MessageId {
        match self {
            Self::Answered { reply, .. } => *reply,
            Self::Degraded { apology, .. } => *apology,
        }
    }
}

/// Sends text into the conversation as if the user had typed it.
#[async_trait]
pub trait DirectSend: Send + Sync {
    /// Appends `text` as a user message, runs one turn and appends one bot
    /// message.
    ///
    /// # Errors
    ///
    /// Fails without touching the history when another turn is in flight
    /// or the conversation does not accept chat input.
    async fn send_text(&self, text: &str) -> Result<TurnOutcome>;
}
