//! Reply classification.
//!
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! 1. Missing-items checklist: a missing-items header, or a numbered list
//!    together with the word "missing"; in both cases only when no phrase of
//!    a dropdown family is present. The numbered-list signal is weak, which
//!    is why the dropdown phrases veto it.
//! 2. Dropdown menu: a section header or report title of a dropdown family.
//! 3. Plain text.

use super::vocabulary::{
    CHECKBOX_GLYPHS, MISSING_ITEMS_HEADERS, PromptFamily, dropdown_families,
};
use crate::session::Message;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const MISSING_ITEMS_TITLE: &str = "Missing Items Selection";

/// A line of the form `<n>. <label>`, optionally behind a checkbox glyph.
static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| {
    let glyphs: String = CHECKBOX_GLYPHS.iter().collect();
    Regex::new(&format!(r"(?m)^[ \t]*(?:[{glyphs}][ \t]*)?\d+\.[ \t]+\S"))
        .expect("numbered line pattern is valid")
});

static MISSING_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bmissing\b").expect("missing word pattern is valid"));

/// Kind of prompt encoded in a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Plain,
    /// Multi-select checklist of numbered order items.
    MissingItemsSelection,
    /// Single-choice menu of checkbox lines.
    DropdownSelection,
}

/// Result of classifying one reply text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPrompt {
    pub kind: PromptKind,
    pub title: Option<String>,
    /// Set for dropdown menus only.
    pub family: Option<PromptFamily>,
}

impl ClassifiedPrompt {
    pub fn plain() -> Self {
        Self {
            kind: PromptKind::Plain,
            title: None,
            family: None,
        }
    }

    pub fn is_structured(&self) -> bool {
        self.kind != PromptKind::Plain
    }
}

/// Classifies a reply text.
///
/// Pure and total: the same text always yields the same result, and any
/// text that does not clearly match a rule is `Plain`. Runs in time linear
/// in the text length.
pub fn classify(text: &str) -> ClassifiedPrompt {
    let lowered = text.to_lowercase();

    if is_missing_items_prompt(&lowered) {
        return ClassifiedPrompt {
            kind: PromptKind::MissingItemsSelection,
            title: Some(MISSING_ITEMS_TITLE.to_string()),
            family: None,
        };
    }

    if let Some(vocabulary) = dropdown_families()
        .iter()
        .find(|vocabulary| vocabulary.markers().any(|phrase| lowered.contains(phrase)))
    {
        return ClassifiedPrompt {
            kind: PromptKind::DropdownSelection,
            title: Some(vocabulary.title.to_string()),
            family: Some(vocabulary.family),
        };
    }

    ClassifiedPrompt::plain()
}

/// Classifies a history entry. Only bot replies can carry prompts; user
/// messages (including "I selected: ..." echoes) are always plain.
pub fn classify_message(message: &Message) -> ClassifiedPrompt {
    if message.is_bot() {
        classify(message.text())
    } else {
        ClassifiedPrompt::plain()
    }
}

fn is_missing_items_prompt(lowered: &str) -> bool {
    let has_header = MISSING_ITEMS_HEADERS
        .iter()
        .any(|header| lowered.contains(header));
    let has_numbered_missing =
        || MISSING_WORD.is_match(lowered) && NUMBERED_LINE.is_match(lowered);

    if !(has_header || has_numbered_missing()) {
        return false;
    }

    !dropdown_families()
        .iter()
        .flat_map(|vocabulary| vocabulary.exclusions())
        .any(|phrase| lowered.contains(phrase))
}
