//! Domain layer of the Triage support chat client.
//!
//! Holds the conversation model and every pure piece of reply handling:
//! classification, option extraction, formatting and the selection widgets.
//! Nothing here performs I/O; collaborators are reached through the
//! [`catalog::CatalogClient`] and [`gateway::SupportGateway`] traits.

pub mod bridge;
pub mod catalog;
pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod prompt;
pub mod session;
pub mod view;
pub mod widget;

// Re-export common error type
pub use error::{Result, TriageError};
