//! Presentation formatting for plain replies.
//!
//! Turns the raw reply text into lines of styled spans. Formatting is a view
//! over the message text; the text itself is never rewritten, so the
//! classifier and extractor keep seeing exactly what the service sent.
//!
//! Transformations, in order:
//!
//! 1. `**...**` becomes bold spans.
//! 2. URLs become link spans, bold links inside a bold span.
//! 3. A recognized emoji followed by a bold span starts a section header.
//! 4. `- ` (or `• `) starts a bullet.
//! 5. `<n>. ` starts a numbered line.
//! 6. A checkbox glyph starts a checkbox line, a checkmark glyph a checkmark line.
//! 7. Blank lines separate paragraphs; other newlines are line breaks.

use crate::prompt::{CHECKBOX_GLYPHS, CHECKMARK_GLYPHS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Emojis the upstream service puts in front of section titles.
const HEADER_EMOJIS: &[&str] = &[
    "🔍", "📋", "📝", "💡", "📷", "📸", "🚨", "✅", "❌", "⚠️", "⚠", "🚗", "✈️", "💰", "💳",
    "📞", "🎯", "🔄", "📦", "🧾", "⏰", "🛵", "🍔", "🛒", "🎉", "ℹ️",
];

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>()"]+"#).expect("url pattern is valid"));

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid"));

static NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.\s+(.*)$").expect("numbered pattern is valid"));

/// Characters that end a sentence rather than a URL.
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', '*', '\'', '"'];

/// Inline piece of a formatted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Span {
    Text(String),
    Bold(String),
    /// Opened outside the chat; following it never leaves the conversation.
    Link(String),
    /// Link written inside a `**...**` span.
    BoldLink(String),
}

/// Block-level role of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineKind {
    Text,
    SectionHeader { emoji: String },
    Bullet,
    Numbered { number: u32 },
    Checkbox,
    Checkmark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedLine {
    pub kind: LineKind,
    pub spans: Vec<Span>,
}

impl FormattedLine {
    /// Line content without styling.
    pub fn plain_text(&self) -> String {
        self.spans
            .iter()
            .map(|span| match span {
                Span::Text(text)
                | Span::Bold(text)
                | Span::Link(text)
                | Span::BoldLink(text) => text.as_str(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Paragraph {
    pub lines: Vec<FormattedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FormattedMessage {
    pub paragraphs: Vec<Paragraph>,
}

impl FormattedMessage {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &FormattedLine> {
        self.paragraphs.iter().flat_map(|p| p.lines.iter())
    }
}

/// Formats a raw reply.
pub fn format_message(text: &str) -> FormattedMessage {
    let mut paragraphs = Vec::new();
    let mut current = Paragraph::default();

    for raw_line in text.lines() {
        if raw_line.trim().is_empty() {
            if !current.lines.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.lines.push(format_line(raw_line.trim()));
    }

    if !current.lines.is_empty() {
        paragraphs.push(current);
    }

    FormattedMessage { paragraphs }
}

fn format_line(line: &str) -> FormattedLine {
    if let Some((emoji, rest)) = section_header(line) {
        return FormattedLine {
            kind: LineKind::SectionHeader {
                emoji: emoji.to_string(),
            },
            spans: parse_inline(rest),
        };
    }

    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("• ")) {
        return FormattedLine {
            kind: LineKind::Bullet,
            spans: parse_inline(rest.trim_start()),
        };
    }

    if let Some(captures) = NUMBERED.captures(line) {
        if let Ok(number) = captures[1].parse() {
            return FormattedLine {
                kind: LineKind::Numbered { number },
                spans: parse_inline(captures.get(2).map_or("", |m| m.as_str())),
            };
        }
    }

    if let Some(rest) = line.strip_prefix(CHECKBOX_GLYPHS) {
        return FormattedLine {
            kind: LineKind::Checkbox,
            spans: parse_inline(rest.trim_start()),
        };
    }

    if let Some(rest) = line.strip_prefix(CHECKMARK_GLYPHS) {
        return FormattedLine {
            kind: LineKind::Checkmark,
            spans: parse_inline(rest.trim_start_matches('\u{fe0f}').trim_start()),
        };
    }

    FormattedLine {
        kind: LineKind::Text,
        spans: parse_inline(line),
    }
}

/// Returns the emoji and the remainder when `line` is `<emoji> **...`.
fn section_header(line: &str) -> Option<(&'static str, &str)> {
    HEADER_EMOJIS.iter().find_map(|emoji| {
        let rest = line.strip_prefix(emoji)?.trim_start_matches('\u{fe0f}').trim_start();
        let bold = BOLD.find(rest)?;
        (bold.start() == 0).then_some((*emoji, rest))
    })
}

fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;

    for captures in BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        push_links(&mut spans, &text[cursor..whole.start()], false);
        push_links(&mut spans, inner.as_str(), true);
        cursor = whole.end();
    }
    push_links(&mut spans, &text[cursor..], false);

    spans
}

fn push_links(spans: &mut Vec<Span>, text: &str, bold: bool) {
    let mut cursor = 0;
    for found in URL.find_iter(text) {
        let url = found.as_str().trim_end_matches(URL_TRAILING);
        if url.len() <= "https://".len() {
            continue;
        }
        push_piece(spans, &text[cursor..found.start()], bold);
        spans.push(if bold {
            Span::BoldLink(url.to_string())
        } else {
            Span::Link(url.to_string())
        });
        cursor = found.start() + url.len();
    }
    push_piece(spans, &text[cursor..], bold);
}

fn push_piece(spans: &mut Vec<Span>, text: &str, bold: bool) {
    if bold {
        if !text.is_empty() {
            spans.push(Span::Bold(text.to_string()));
        }
    } else {
        push_text(spans, text);
    }
}

fn push_text(spans: &mut Vec<Span>, text: &str) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(Span::Text(previous)) => previous.push_str(text),
        _ => spans.push(Span::Text(text.to_string())),
    }
}
