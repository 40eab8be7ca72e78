use triage_core::TriageError;
use triage_core::session::MessageId;

/// Result of a guided step (bootstrap, selections, image upload).
///
/// Every variant names the bot message the step appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The collaborator answered.
    Answered(MessageId),
    /// The collaborator failed and a fallback message was appended.
    Degraded { message: MessageId, error: TriageError },
}

impl StepOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }

    pub fn message_id(&self) -> MessageId {
        match self {
            Self::Answered(id) => *id,
            Self::Degraded { message, .. } => *message,
        }
    }
}
