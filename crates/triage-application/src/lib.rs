//! Application layer for TRIAGE.
//!
//! This crate provides the conversation state machine that coordinates the
//! catalog and support collaborators with the message history.

pub mod conversation;
pub mod templates;

pub use conversation::{ConversationController, StepOutcome};
pub use templates::{MessageTemplates, service_display_name};
