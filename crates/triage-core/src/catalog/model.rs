//! Catalog entries.

use serde::{Deserialize, Serialize};

/// A top-level issue category (e.g. "Order Quality & Accuracy").
///
/// Identity is the `id`; the name is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A concrete issue within a category (e.g. "Missing items in delivery").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubIssue {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl SubIssue {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Response body of the category listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryList {
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Response body of the sub-issue listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubIssueList {
    #[serde(default)]
    pub subissues: Vec<SubIssue>,
}
