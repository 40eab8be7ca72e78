//! Conversation state types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a conversation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Service or user type was absent at activation; the user belongs on
    /// the dashboard.
    MissingContext,
    /// The user left the chat screen.
    NavigatedAway,
}

/// Top-level position of the guided conversation.
///
/// Structured-prompt widgets are spawned while in `AwaitingChatInput`
/// without leaving that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ConversationState {
    /// Session context accepted, categories not loaded yet.
    Bootstrapping,
    /// Waiting for the user to pick a category.
    AwaitingCategory,
    /// Waiting for the user to pick a sub-issue.
    AwaitingSubIssue,
    /// Free chat with the upstream service.
    AwaitingChatInput,
    /// No further operations are accepted.
    Terminated(TerminationReason),
}

impl ConversationState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bootstrapping => "bootstrapping",
            Self::AwaitingCategory => "awaiting_category",
            Self::AwaitingSubIssue => "awaiting_sub_issue",
            Self::AwaitingChatInput => "awaiting_chat_input",
            Self::Terminated(_) => "terminated",
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }

    /// True when the host should send the user back to the dashboard.
    pub fn redirect_to_dashboard(&self) -> bool {
        matches!(self, Self::Terminated(TerminationReason::MissingContext))
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
