//! Presentation helpers: display names, a console chat renderer and JSON export.

use crate::conversation::{Conversation, ConversationMessage, INITIATOR_ID, ORCHESTRATOR_ID};
use crate::observer::{ObserverError, TurnObserver};
use crate::orchestration::RunOutcome;
use colored::Colorize;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;

lazy_static! {
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z])([A-Z])").unwrap();
}

/// Split a CamelCase participant id into words.
///
/// ```
/// use personadocs::transcript::display_name;
///
/// assert_eq!(display_name("DeveloperDocumentationAgent"), "Developer Documentation Agent");
/// assert_eq!(display_name("initiator"), "User");
/// assert_eq!(display_name("orchestrator"), "Group Chat Manager");
/// ```
pub fn display_name(id: &str) -> String {
    match id {
        INITIATOR_ID => "User".to_string(),
        ORCHESTRATOR_ID => "Group Chat Manager".to_string(),
        _ => CAMEL_BOUNDARY.replace_all(id, "$1 $2").into_owned(),
    }
}

/// Renders each turn as a labelled chat bubble on a writer (stdout by default).
pub struct ConsoleObserver<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleObserver<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> TurnObserver for ConsoleObserver<W> {
    fn notify(&self, message: &ConversationMessage) -> Result<(), ObserverError> {
        let mut out = self.out.lock().map_err(|_| "console writer lock poisoned")?;
        let name = display_name(&message.sender_id);
        let header = if message.is_opening() {
            name.as_str().green().bold()
        } else if message.is_closing() {
            name.as_str().yellow().bold()
        } else {
            name.as_str().cyan().bold()
        };
        writeln!(out, "{}:", header)?;
        writeln!(out, "{}", message.content)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}

/// One line of an exported transcript.
#[derive(Debug, Serialize)]
pub struct TranscriptEntry<'a> {
    pub sequence_index: usize,
    pub sender_id: &'a str,
    pub display_name: String,
    pub content: &'a str,
    pub timestamp: String,
}

/// Serializable view of a finished run.
#[derive(Debug, Serialize)]
pub struct Transcript<'a> {
    pub run_id: &'a str,
    pub status: &'static str,
    pub rounds: usize,
    pub total_tokens_used: usize,
    pub messages: Vec<TranscriptEntry<'a>>,
}

impl<'a> Transcript<'a> {
    pub fn from_outcome(outcome: &'a RunOutcome) -> Self {
        Self {
            run_id: &outcome.run_id,
            status: outcome.status.label(),
            rounds: outcome.rounds,
            total_tokens_used: outcome.total_tokens_used,
            messages: entries(&outcome.conversation),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn entries(conversation: &Conversation) -> Vec<TranscriptEntry<'_>> {
    conversation
        .iter()
        .map(|m| TranscriptEntry {
            sequence_index: m.sequence_index,
            sender_id: &m.sender_id,
            display_name: display_name(&m.sender_id),
            content: &m.content,
            timestamp: m.timestamp.to_rfc3339(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_wrapper::Role;

    #[test]
    fn test_display_name_keeps_acronym_runs() {
        assert_eq!(display_name("ApiUserGuideAgent"), "Api User Guide Agent");
        assert_eq!(display_name("plain"), "plain");
    }

    #[test]
    fn test_console_observer_writes_label_and_content() {
        colored::control::set_override(false);
        let observer = ConsoleObserver::new(Vec::new());
        observer
            .notify(&ConversationMessage::new(
                "ExecutiveSummaryAgent",
                Role::Assistant,
                "Saves money.",
                1,
            ))
            .unwrap();
        let text = String::from_utf8(observer.into_inner()).unwrap();
        assert_eq!(text, "Executive Summary Agent:\nSaves money.\n\n");
    }
}
