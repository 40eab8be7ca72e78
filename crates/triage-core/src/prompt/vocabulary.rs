//! Phrase tables for structured prompts.
//!
//! This is the one place that knows which phrases the upstream service uses
//! for its menus. Adding a prompt family means adding an entry to
//! `DROPDOWN_FAMILIES`; its phrases then automatically exclude the text from
//! the weaker missing-items heuristic. Bump `PROMPT_VOCABULARY_VERSION`
//! whenever a phrase changes.
//!
//! All phrases are stored lowercase and matched against lowercased text.

use serde::{Deserialize, Serialize};

pub const PROMPT_VOCABULARY_VERSION: u32 = 3;

/// Glyphs that mark an unchecked option line.
pub const CHECKBOX_GLYPHS: &[char] = &['☐', '□', '⬜'];

/// Glyphs that mark a completed/confirmed line.
pub const CHECKMARK_GLYPHS: &[char] = &['✅', '✔', '✓'];

/// Headers that introduce the missing-items checklist.
pub const MISSING_ITEMS_HEADERS: &[&str] = &[
    "which items are missing",
    "missing items selection",
    "select which items are actually missing",
];

/// Menus the upstream service renders as single-choice lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptFamily {
    DriverHarassment,
    AppBookingIssues,
    AirportBooking,
    CancellationRefund,
}

/// Phrases belonging to one dropdown family.
#[derive(Debug, Clone, Copy)]
pub struct FamilyVocabulary {
    pub family: PromptFamily,
    /// Display title of the report this menu belongs to.
    pub title: &'static str,
    /// Section headers introducing the option list ("select ... type").
    pub section_headers: &'static [&'static str],
    /// Report titles that identify the family on their own.
    pub report_titles: &'static [&'static str],
    /// Phrases that only exclude the missing-items heuristic.
    pub extra_exclusions: &'static [&'static str],
}

impl FamilyVocabulary {
    /// Phrases that mark text as belonging to this family.
    pub fn markers(&self) -> impl Iterator<Item = &'static str> {
        self.section_headers
            .iter()
            .chain(self.report_titles.iter())
            .copied()
    }

    /// Phrases that keep the text out of the missing-items heuristic.
    pub fn exclusions(&self) -> impl Iterator<Item = &'static str> {
        self.markers().chain(self.extra_exclusions.iter().copied())
    }
}

const DROPDOWN_FAMILIES: &[FamilyVocabulary] = &[
    FamilyVocabulary {
        family: PromptFamily::DriverHarassment,
        title: "Driver Harassment Report",
        section_headers: &["select harassment type"],
        report_titles: &["driver harassment report"],
        extra_exclusions: &["harassment report"],
    },
    FamilyVocabulary {
        family: PromptFamily::AppBookingIssues,
        title: "App/Booking Issues Report",
        section_headers: &["select issue type"],
        report_titles: &["app/booking issues report"],
        extra_exclusions: &[],
    },
    FamilyVocabulary {
        family: PromptFamily::AirportBooking,
        title: "Airport Booking Problems",
        section_headers: &["select airport issue type"],
        report_titles: &["airport booking problems"],
        extra_exclusions: &[],
    },
    FamilyVocabulary {
        family: PromptFamily::CancellationRefund,
        title: "Cancellation/Refund Policy Issues",
        section_headers: &["select policy issue type"],
        report_titles: &["cancellation/refund policy issues"],
        extra_exclusions: &[],
    },
];

/// All dropdown families, in matching priority order.
pub fn dropdown_families() -> &'static [FamilyVocabulary] {
    DROPDOWN_FAMILIES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrases_are_lowercase() {
        let all = dropdown_families()
            .iter()
            .flat_map(|f| f.exclusions())
            .chain(MISSING_ITEMS_HEADERS.iter().copied());
        for phrase in all {
            assert_eq!(phrase, phrase.to_lowercase(), "phrase must be lowercase");
        }
    }

    #[test]
    fn test_every_family_has_a_marker() {
        for family in dropdown_families() {
            assert!(family.markers().next().is_some(), "{:?}", family.family);
        }
    }
}
