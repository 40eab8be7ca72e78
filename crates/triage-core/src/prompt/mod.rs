//! Structured prompt recognition.
//!
//! The upstream service answers in free text, but some replies are really
//! selection menus. This module decides which replies are menus
//! (`classifier`), pulls the selectable options out of them (`extractor`),
//! and keeps the phrase tables both rely on (`vocabulary`).
//!
//! Everything here is a pure function of the message text: no state, no
//! errors. Unrecognized or malformed input degrades to `PromptKind::Plain`
//! or to an empty option list.

mod classifier;
mod extractor;
mod vocabulary;

pub use classifier::{ClassifiedPrompt, PromptKind, classify, classify_message};
pub use extractor::{
    DropdownOption, ExtractedOptions, MissingItemOption, OrderContext, extract,
    extract_dropdown_options, extract_missing_items, extract_order_context,
};
pub use vocabulary::{
    CHECKBOX_GLYPHS, CHECKMARK_GLYPHS, FamilyVocabulary, MISSING_ITEMS_HEADERS,
    PROMPT_VOCABULARY_VERSION, PromptFamily, dropdown_families,
};
