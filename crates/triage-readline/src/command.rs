//! Parsing of REPL input lines.

use std::path::PathBuf;
use triage_core::session::MessageId;

/// Slash commands offered for completion.
pub const COMMANDS: &[&str] = &["/toggle", "/submit", "/image", "/history", "/quit"];

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// A bare number: picks a category, sub-issue or menu option, or toggles
    /// a checklist item.
    Choose(usize),
    Toggle(u32),
    Submit,
    Image {
        path: PathBuf,
        message_id: Option<MessageId>,
    },
    History,
    Quit,
    /// Anything else is sent as chat text.
    Say(String),
    Invalid(String),
}

pub fn parse(line: &str) -> ReplCommand {
    let line = line.trim();

    if let Ok(number) = line.parse::<usize>() {
        return ReplCommand::Choose(number);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return ReplCommand::Say(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("quit" | "exit"), None, None) => ReplCommand::Quit,
        (Some("history"), None, None) => ReplCommand::History,
        (Some("submit"), None, None) => ReplCommand::Submit,
        (Some("toggle"), Some(number), None) => match number.parse() {
            Ok(n) => ReplCommand::Toggle(n),
            Err(_) => ReplCommand::Invalid(format!("Not an item number: {number}")),
        },
        (Some("image"), Some(path), id) => match id.map(str::parse::<MessageId>).transpose() {
            Ok(message_id) if parts.next().is_none() => ReplCommand::Image {
                path: PathBuf::from(path),
                message_id,
            },
            Ok(_) => ReplCommand::Invalid("Usage: /image <path> [message-id]".to_string()),
            Err(_) => ReplCommand::Invalid(format!("Not a message id: {}", id.unwrap_or(""))),
        },
        (Some("toggle"), _, _) => ReplCommand::Invalid("Usage: /toggle <n>".to_string()),
        (Some("image"), _, _) => {
            ReplCommand::Invalid("Usage: /image <path> [message-id]".to_string())
        }
        _ => ReplCommand::Invalid(format!("Unknown command: {line}")),
    }
}
