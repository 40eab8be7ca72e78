//! Issue catalog module.
//!
//! The catalog (categories and their sub-issues) is owned by an external
//! service. This module only describes the shape the conversation consumes
//! and the client interface used to fetch it.

mod client;
mod model;

pub use client::CatalogClient;
pub use model::{Category, CategoryList, SubIssue, SubIssueList};
