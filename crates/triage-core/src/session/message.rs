//! Conversation message types.
//!
//! Messages are created once and appended to the history; nothing in this
//! module allows mutating a message after construction.

use crate::catalog::{Category, SubIssue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message within one conversation.
///
/// Derived from the creation time in milliseconds with a sender-specific
/// offset, so a user message and the bot message created in the same
/// millisecond never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MessageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    fn id_offset(self) -> u64 {
        match self {
            Sender::User => 0,
            Sender::Bot => 1,
        }
    }
}

/// Structured hint attached to a bot message.
///
/// Exactly one hint applies per message, so combinations such as "offers
/// categories and requests an image" cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MessageHint {
    /// Ordinary reply. Its text may still encode a structured prompt, which
    /// is detected by the classifier at render time.
    #[default]
    Plain,
    /// The message asks the user to pick one of these categories.
    OffersCategories(Vec<Category>),
    /// The message asks the user to pick one of these sub-issues.
    OffersSubIssues(Vec<SubIssue>),
    /// The upstream service wants a photo attached to this message.
    RequestsImage { prompt: Option<String> },
}

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    sender: Sender,
    text: String,
    created_at: DateTime<Utc>,
    hint: MessageHint,
}

impl Message {
    /// Creates a message typed (or synthesized) on the user's side.
    pub fn user(id: MessageId, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            sender: Sender::User,
            text: text.into(),
            created_at,
            hint: MessageHint::Plain,
        }
    }

    /// Creates a bot message carrying `hint`.
    pub fn bot(
        id: MessageId,
        text: impl Into<String>,
        hint: MessageHint,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sender: Sender::Bot,
            text: text.into(),
            created_at,
            hint,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// The raw text exactly as typed or received.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn hint(&self) -> &MessageHint {
        &self.hint
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }

    pub fn offers_categories(&self) -> bool {
        matches!(self.hint, MessageHint::OffersCategories(_))
    }

    pub fn offers_sub_issues(&self) -> bool {
        matches!(self.hint, MessageHint::OffersSubIssues(_))
    }

    pub fn requests_image(&self) -> bool {
        matches!(self.hint, MessageHint::RequestsImage { .. })
    }

    /// Prompt text shown next to the upload control, if the server sent one.
    pub fn image_prompt(&self) -> Option<&str> {
        match &self.hint {
            MessageHint::RequestsImage { prompt } => prompt.as_deref(),
            _ => None,
        }
    }
}

/// Hands out strictly increasing message ids.
#[derive(Debug, Default)]
pub struct MessageIdSequence {
    last: Option<u64>,
}

impl MessageIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for a message created by `sender` at `now`.
    ///
    /// Ids are `millis * 2 + sender offset`, bumped past the previous id when
    /// the clock has not advanced (or went backwards).
    pub fn next(&mut self, sender: Sender, now: DateTime<Utc>) -> MessageId {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let mut candidate = millis.saturating_mul(2) + sender.id_offset();
        if let Some(last) = self.last {
            if candidate <= last {
                candidate = last + 1;
            }
        }
        self.last = Some(candidate);
        MessageId(candidate)
    }
}
