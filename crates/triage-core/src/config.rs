//! Client configuration model.
//!
//! Every field has a default so a missing or partial `config.toml` still
//! yields a usable configuration. Loading and environment overrides live in
//! the infrastructure crate.

use crate::error::{Result, TriageError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MISSING_ITEMS_SUB_ISSUE_ID: &str = "handle_missing_items";
pub const DEFAULT_USERNAME: &str = "anonymous";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub conversation: ConversationConfig,
    pub templates: TemplateConfig,
}

/// Where the support service lives.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout enforced by the HTTP transport.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ConversationConfig {
    /// Sub-issue id routed to the dedicated missing-items endpoint.
    pub missing_items_sub_issue_id: String,
    /// Username used when the launch context carries none.
    pub default_username: String,
    /// Message text sent with the missing-items request.
    pub missing_items_request: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            missing_items_sub_issue_id: DEFAULT_MISSING_ITEMS_SUB_ISSUE_ID.to_string(),
            default_username: DEFAULT_USERNAME.to_string(),
            missing_items_request: "Missing items complaint".to_string(),
        }
    }
}

/// minijinja templates for the messages the client writes itself.
///
/// Available variables: `username`, `service`, `service_name`,
/// `user_type`, `category`, `sub_issue`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TemplateConfig {
    pub greeting: String,
    pub sub_issue_prompt: String,
    pub describe_issue: String,
    pub catalog_apology: String,
    pub chat_apology: String,
    pub image_apology: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            greeting: "Hi {{ username }}! 👋 I'm here to help with your {{ service_name }} issue. \
                       Please select a category:"
                .to_string(),
            sub_issue_prompt: "Please select the specific issue with {{ category }}:".to_string(),
            describe_issue: "Please describe your issue with \"{{ sub_issue }}\" in detail. \
                             You can also upload images if needed."
                .to_string(),
            catalog_apology: "Sorry, I couldn't load the support options right now. \
                              Please reload to try again."
                .to_string(),
            chat_apology: "Sorry, I encountered an error. Please try again.".to_string(),
            image_apology: "Sorry, I couldn't process your image. Please try uploading it again."
                .to_string(),
        }
    }
}

impl ClientConfig {
    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(TriageError::config(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            )));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(TriageError::config("api.request_timeout_secs must be positive"));
        }
        if self.conversation.missing_items_sub_issue_id.trim().is_empty() {
            return Err(TriageError::config(
                "conversation.missing_items_sub_issue_id must not be empty",
            ));
        }
        Ok(())
    }
}
