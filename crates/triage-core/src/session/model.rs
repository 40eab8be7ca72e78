//! Session domain model.
//!
//! A `ConversationSession` lives for exactly one activation of the chat
//! screen. It carries the context sent with every upstream call.

use crate::catalog::{Category, SubIssue};
use crate::error::{Result, TriageError};
use serde::{Deserialize, Serialize};

/// Context handed to the chat screen by whoever launched it.
///
/// Every field is optional here; `into_session_context` enforces which ones
/// are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchContext {
    pub service: Option<String>,
    pub user_type: Option<String>,
    pub username: Option<String>,
    pub order_id: Option<String>,
}

/// Validated context of a running conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Service identifier (e.g. `grab_food`)
    pub service: String,
    /// Role of the user within the service (e.g. `customer`, `driver`)
    pub user_type: String,
    pub username: String,
    /// Order the complaint is about, if launched from an order
    pub order_id: Option<String>,
}

impl LaunchContext {
    /// Validates the launch context.
    ///
    /// Blank strings count as absent. A missing username falls back to
    /// `default_username`.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::MissingContext` when service or user type is
    /// absent.
    pub fn into_session_context(self, default_username: &str) -> Result<SessionContext> {
        let service = non_blank(self.service).ok_or(TriageError::MissingContext("service"))?;
        let user_type =
            non_blank(self.user_type).ok_or(TriageError::MissingContext("user_type"))?;

        Ok(SessionContext {
            service,
            user_type,
            username: non_blank(self.username).unwrap_or_else(|| default_username.to_string()),
            order_id: non_blank(self.order_id),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// State of one chat screen activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSession {
    conversation_id: String,
    context: SessionContext,
    selected_category: Option<Category>,
    selected_sub_issue: Option<SubIssue>,
}

impl ConversationSession {
    pub fn new(conversation_id: impl Into<String>, context: SessionContext) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            context,
            selected_category: None,
            selected_sub_issue: None,
        }
    }

    /// Opaque id fixed at session start.
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.selected_category.as_ref()
    }

    pub fn selected_sub_issue(&self) -> Option<&SubIssue> {
        self.selected_sub_issue.as_ref()
    }

    /// Records the chosen category. Any previously chosen sub-issue belongs
    /// to the old category and is cleared.
    pub fn select_category(&mut self, category: Category) {
        self.selected_category = Some(category);
        self.selected_sub_issue = None;
    }

    pub fn select_sub_issue(&mut self, sub_issue: SubIssue) {
        self.selected_sub_issue = Some(sub_issue);
    }
}
