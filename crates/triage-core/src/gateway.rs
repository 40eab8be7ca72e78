//! Upstream support service interface.
//!
//! Request/response shapes for the three turn endpoints plus the trait the
//! conversation controller calls them through. Fields the service returns
//! beyond the ones listed here are ignored.

use crate::error::Result;
use crate::session::{Message, MessageId, Sender};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One history entry as sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id(),
            text: message.text().to_string(),
            sender: message.sender(),
            timestamp: message.created_at(),
        }
    }
}

/// Body of a chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurnRequest {
    pub message: String,
    pub service: String,
    pub user_type: String,
    pub username: String,
    pub conversation_id: String,
    pub category: Option<String>,
    pub sub_issue: Option<String>,
    /// History snapshot at call time, including the message being sent.
    pub messages: Vec<HistoryEntry>,
    pub order_id: Option<String>,
}

/// Reply to a chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatTurnReply {
    pub response: String,
    #[serde(default)]
    pub requires_image: bool,
    #[serde(default)]
    pub image_request: Option<String>,
}

/// Base64 image body without any `data:` URI prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    /// Encodes raw image bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(BASE64_STANDARD.encode(bytes))
    }

    /// Accepts already-encoded data, dropping a `data:<mime>;base64,` prefix.
    pub fn from_encoded(encoded: &str) -> Self {
        let body = match encoded.split_once(";base64,") {
            Some((prefix, body)) if prefix.starts_with("data:") => body,
            _ => encoded,
        };
        Self(body.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Body of an image turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageTurnRequest {
    pub image_data: ImageData,
    pub service: String,
    pub user_type: String,
    pub username: String,
    pub conversation_id: String,
    /// The message the image answers.
    pub message_id: MessageId,
    pub category: Option<String>,
    pub sub_issue: Option<String>,
    pub messages: Vec<HistoryEntry>,
}

/// Reply carrying only a response text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TurnReply {
    pub response: String,
}

/// Body of the dedicated missing-items turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingItemsRequest {
    pub message: String,
    pub username: String,
    pub order_id: Option<String>,
}

/// Reply of the missing-items turn.
///
/// `success == false` still carries a displayable response (e.g. the order
/// could not be found).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MissingItemsReply {
    pub response: String,
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

/// The upstream text-generation service, seen as a black box.
#[async_trait]
pub trait SupportGateway: Send + Sync {
    /// Sends one user message and returns the service's reply.
    async fn chat_turn(&self, request: ChatTurnRequest) -> Result<ChatTurnReply>;

    /// Uploads an image attached to an earlier message.
    async fn image_turn(&self, request: ImageTurnRequest) -> Result<TurnReply>;

    /// Asks the dedicated endpoint for the missing-items checklist.
    async fn missing_items_turn(&self, request: MissingItemsRequest) -> Result<MissingItemsReply>;
}
