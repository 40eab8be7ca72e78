//! Option extraction for structured prompts.
//!
//! Options are never stored; they are recomputed from the message text each
//! time it is rendered. Lines that do not look like options are skipped.

use super::classifier::PromptKind;
use super::vocabulary::CHECKBOX_GLYPHS;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMBERED_OPTION: Lazy<Regex> = Lazy::new(|| {
    let glyphs: String = CHECKBOX_GLYPHS.iter().collect();
    Regex::new(&format!(r"^\s*(?:[{glyphs}]\s*)?(\d+)\.\s+(\S.*?)\s*$"))
        .expect("numbered option pattern is valid")
});

static CHECKBOX_OPTION: Lazy<Regex> = Lazy::new(|| {
    let glyphs: String = CHECKBOX_GLYPHS.iter().collect();
    Regex::new(&format!(r"^\s*[{glyphs}]\s*(\S.*?)\s*$")).expect("checkbox option pattern is valid")
});

static ORDER_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)your order:\**[ \t]*([A-Za-z0-9][\w-]*)[ \t]+from[ \t]+(\S.*?)[ \t]*$")
        .expect("order context pattern is valid")
});

/// One entry of the missing-items checklist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissingItemOption {
    /// 1-based number as printed in the reply.
    pub sequence_number: u32,
    pub label: String,
}

impl MissingItemOption {
    pub fn new(sequence_number: u32, label: impl Into<String>) -> Self {
        Self {
            sequence_number,
            label: label.into(),
        }
    }
}

/// One entry of a dropdown menu. The label is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DropdownOption {
    pub label: String,
}

impl DropdownOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Order annotation shown above the checklist. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderContext {
    pub order_id: String,
    pub store_name: String,
}

/// Options extracted for a classified reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedOptions {
    None,
    MissingItems {
        items: Vec<MissingItemOption>,
        order: Option<OrderContext>,
    },
    Dropdown(Vec<DropdownOption>),
}

impl ExtractedOptions {
    /// True when there is nothing to render as a widget.
    ///
    /// The classifier can report a menu whose body has no option lines; such
    /// replies are shown as plain text instead.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::MissingItems { items, .. } => items.is_empty(),
            Self::Dropdown(options) => options.is_empty(),
        }
    }
}

/// Extracts the options for a reply already classified as `kind`.
pub fn extract(text: &str, kind: PromptKind) -> ExtractedOptions {
    match kind {
        PromptKind::Plain => ExtractedOptions::None,
        PromptKind::MissingItemsSelection => ExtractedOptions::MissingItems {
            items: extract_missing_items(text),
            order: extract_order_context(text),
        },
        PromptKind::DropdownSelection => ExtractedOptions::Dropdown(extract_dropdown_options(text)),
    }
}

/// Collects `<glyph> <n>. <label>` and `<n>. <label>` lines in document order.
pub fn extract_missing_items(text: &str) -> Vec<MissingItemOption> {
    text.lines()
        .filter_map(|line| {
            let captures = NUMBERED_OPTION.captures(line)?;
            let sequence_number = captures[1].parse().ok()?;
            Some(MissingItemOption::new(sequence_number, captures[2].trim()))
        })
        .collect()
}

/// Collects `<glyph> <label>` lines in document order.
pub fn extract_dropdown_options(text: &str) -> Vec<DropdownOption> {
    text.lines()
        .filter_map(|line| {
            let captures = CHECKBOX_OPTION.captures(line)?;
            Some(DropdownOption::new(captures[1].trim()))
        })
        .collect()
}

/// Finds a "Your Order: <id> from <store>" annotation.
pub fn extract_order_context(text: &str) -> Option<OrderContext> {
    let captures = ORDER_CONTEXT.captures(text)?;
    let store_name = captures[2].trim_end_matches('*').trim();
    if store_name.is_empty() {
        return None;
    }
    Some(OrderContext {
        order_id: captures[1].to_string(),
        store_name: store_name.to_string(),
    })
}
