//! Conversation state machine.
//!
//! # Module Structure
//!
//! - `controller`: `ConversationController`, the single owner of the session and its history
//! - `sending_guard`: the single-turn-in-flight guard
//! - `outcome`: results of the guided steps

mod controller;
mod outcome;
mod sending_guard;

pub use controller::{ConversationController, ECHO_PREFIX};
pub use outcome::StepOutcome;
