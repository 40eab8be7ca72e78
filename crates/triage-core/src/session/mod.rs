//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Session context and the per-activation `ConversationSession`
//! - `message`: Immutable history entries (`Message`, `MessageHint`, `Sender`)
//! - `state`: Top-level conversation states (`ConversationState`)

mod message;
mod model;
mod state;

// Re-export public API
pub use message::{Message, MessageHint, MessageId, MessageIdSequence, Sender};
pub use model::{ConversationSession, LaunchContext, SessionContext};
pub use state::{ConversationState, TerminationReason};
