//! Upstream collaborators of the Triage client, reached over HTTP.

pub mod support_api_client;

pub use support_api_client::SupportApiClient;
