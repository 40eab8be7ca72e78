//! Catalog client trait.

use super::model::{Category, SubIssue};
use crate::error::Result;
use async_trait::async_trait;

/// Read access to the issue taxonomy for a service and role.
///
/// Implementations talk to the catalog service; the conversation only relies
/// on the returned order being the display order.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Lists the categories offered to `user_type` users of `service`.
    async fn categories(&self, service: &str, user_type: &str) -> Result<Vec<Category>>;

    /// Lists the sub-issues of one category.
    async fn sub_issues(
        &self,
        service: &str,
        user_type: &str,
        category_id: &str,
    ) -> Result<Vec<SubIssue>>;
}
