//! Deciding how a history entry is shown.
//!
//! Structural hints attached by the controller take precedence; only plain
//! bot replies go through the classifier. A structured reply whose options
//! cannot be extracted falls back to formatted text.

use crate::catalog::{Category, SubIssue};
use crate::format::{FormattedMessage, format_message};
use crate::session::{Message, MessageHint};
use crate::widget::{DropdownWidget, MissingItemsWidget};

/// Caption shown instead of the raw checklist text.
pub const MISSING_ITEMS_CAPTION: &str = "Select the items missing from your order, then submit.";

/// Caption shown instead of the raw menu text.
pub const DROPDOWN_CAPTION: &str = "Choose the option that best describes your issue.";

/// Render-ready form of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageView {
    Formatted(FormattedMessage),
    CategoryChoices {
        body: FormattedMessage,
        categories: Vec<Category>,
    },
    SubIssueChoices {
        body: FormattedMessage,
        sub_issues: Vec<SubIssue>,
    },
    ImageRequest {
        body: FormattedMessage,
        prompt: Option<String>,
    },
    MissingItems {
        caption: &'static str,
        widget: MissingItemsWidget,
    },
    Dropdown {
        caption: &'static str,
        widget: DropdownWidget,
    },
}

impl MessageView {
    pub fn is_widget(&self) -> bool {
        matches!(self, Self::MissingItems { .. } | Self::Dropdown { .. })
    }
}

/// Builds the view for `message`. Pure; call it on every render.
pub fn present(message: &Message) -> MessageView {
    match message.hint() {
        MessageHint::OffersCategories(categories) => MessageView::CategoryChoices {
            body: format_message(message.text()),
            categories: categories.clone(),
        },
        MessageHint::OffersSubIssues(sub_issues) => MessageView::SubIssueChoices {
            body: format_message(message.text()),
            sub_issues: sub_issues.clone(),
        },
        MessageHint::RequestsImage { prompt } => MessageView::ImageRequest {
            body: format_message(message.text()),
            prompt: prompt.clone(),
        },
        MessageHint::Plain => {
            if let Some(widget) = MissingItemsWidget::from_message(message) {
                MessageView::MissingItems {
                    caption: MISSING_ITEMS_CAPTION,
                    widget,
                }
            } else if let Some(widget) = DropdownWidget::from_message(message) {
                MessageView::Dropdown {
                    caption: DROPDOWN_CAPTION,
                    widget,
                }
            } else {
                MessageView::Formatted(format_message(message.text()))
            }
        }
    }
}
