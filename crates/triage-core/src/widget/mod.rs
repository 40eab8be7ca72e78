//! Interactive widgets for structured prompts.
//!
//! A widget is created per rendered message and owns only its transient
//! selection. Submitting turns the selection into canonical text and hands
//! it to a [`DirectSend`](crate::bridge::DirectSend) implementation.

mod dropdown;
mod missing_items;

pub use dropdown::DropdownWidget;
pub use missing_items::{ALL_ITEMS_PRESENT, MissingItemsWidget};
