use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::command::COMMANDS;

const TOGGLE: &str = "/toggle";

/// rustyline helper for the triage prompt.
///
/// Completes slash commands, and the item numbers of the checklist on
/// screen after `/toggle`.
#[derive(Clone)]
pub struct CliHelper {
    commands: Vec<String>,
    /// Sequence numbers of the active checklist; empty when there is none.
    checklist: Vec<u32>,
}

impl CliHelper {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|cmd| cmd.to_string()).collect(),
            checklist: Vec::new(),
        }
    }

    pub fn set_checklist(&mut self, numbers: impl IntoIterator<Item = u32>) {
        self.checklist = numbers.into_iter().collect();
    }

    /// Start offset of the word being completed and its candidates.
    fn candidates(&self, line: &str) -> (usize, Vec<String>) {
        if !line.starts_with('/') {
            return (0, Vec::new());
        }

        let Some(space) = line.rfind(' ') else {
            let commands = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .cloned()
                .collect();
            return (0, commands);
        };

        let start = space + 1;
        if line[..space].trim_end() != TOGGLE {
            return (start, Vec::new());
        }
        let partial = &line[start..];
        let numbers = self
            .checklist
            .iter()
            .map(u32::to_string)
            .filter(|number| number.starts_with(partial))
            .collect();
        (start, numbers)
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, candidates) = self.candidates(&line[..pos]);
        let pairs = candidates
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    /// Hints the rest of the word when exactly one candidate remains.
    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let (start, candidates) = self.candidates(line);
        let typed = line.len() - start;
        match candidates.as_slice() {
            [only] if only.len() > typed => Some(only[typed..].to_string()),
            _ => None,
        }
    }
}

impl Validator for CliHelper {}
