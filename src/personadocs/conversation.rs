//! The shared, append-only message history of one orchestration run.
//!
//! A [`Conversation`] is created fresh by every
//! [`Orchestrator::run`](crate::orchestration::Orchestrator::run) call, seeded with the
//! opening message at sequence index 0, and handed back to the caller once the run
//! terminates. Participants only ever see `&Conversation`.
//!
//! ```
//! use personadocs::conversation::{Conversation, ConversationMessage, INITIATOR_ID};
//! use personadocs::Role;
//!
//! let mut conversation = Conversation::new();
//! let opening = ConversationMessage::new(
//!     INITIATOR_ID,
//!     Role::User,
//!     "explain function foo",
//!     conversation.next_sequence_index(),
//! );
//! conversation.append(opening).unwrap();
//!
//! assert_eq!(conversation.len(), 1);
//! assert_eq!(conversation.last().unwrap().sequence_index, 0);
//! ```

use crate::client_wrapper::Role;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Sender id of the caller's opening message.
pub const INITIATOR_ID: &str = "initiator";

/// Sender id of messages produced by the orchestrator itself (the closing line).
pub const ORCHESTRATOR_ID: &str = "orchestrator";

/// A single message appended to a [`Conversation`].
///
/// Immutable once appended: the conversation only hands out shared references.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationMessage {
    /// Participant id, [`INITIATOR_ID`] or [`ORCHESTRATOR_ID`].
    pub sender_id: String,
    pub role: Role,
    /// Message body. `Arc<str>` keeps clones cheap when the message is fanned out to
    /// observers and event handlers.
    #[serde(serialize_with = "serialize_arc_str")]
    pub content: Arc<str>,
    /// Position in the conversation; the sole ordering key.
    pub sequence_index: usize,
    pub timestamp: DateTime<Utc>,
}

fn serialize_arc_str<S>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(value)
}

impl ConversationMessage {
    pub fn new(
        sender_id: impl Into<String>,
        role: Role,
        content: impl AsRef<str>,
        sequence_index: usize,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            role,
            content: Arc::from(content.as_ref()),
            sequence_index,
            timestamp: Utc::now(),
        }
    }

    /// `true` for the caller's opening message.
    pub fn is_opening(&self) -> bool {
        self.sender_id == INITIATOR_ID
    }

    /// `true` for the orchestrator's closing message.
    pub fn is_closing(&self) -> bool {
        self.sender_id == ORCHESTRATOR_ID
    }
}

/// Reasons an append can be refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// The run already terminated; the history is frozen.
    Sealed,
    /// The message was built for a different position than the next free one.
    OutOfOrder { expected: usize, actual: usize },
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationError::Sealed => write!(f, "Conversation is sealed"),
            ConversationError::OutOfOrder { expected, actual } => write!(
                f,
                "Out of order message: expected sequence index {}, got {}",
                expected, actual
            ),
        }
    }
}

impl Error for ConversationError {}

/// Ordered, append-only history of one orchestration run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    #[serde(skip)]
    sealed: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence index the next appended message must carry.
    pub fn next_sequence_index(&self) -> usize {
        self.messages.len()
    }

    /// Append a message built for [`Conversation::next_sequence_index`].
    pub fn append(
        &mut self,
        message: ConversationMessage,
    ) -> Result<&ConversationMessage, ConversationError> {
        if self.sealed {
            return Err(ConversationError::Sealed);
        }
        let expected = self.next_sequence_index();
        if message.sequence_index != expected {
            return Err(ConversationError::OutOfOrder {
                expected,
                actual: message.sequence_index,
            });
        }
        self.messages.push(message);
        Ok(&self.messages[expected])
    }

    /// Freeze the history. Called by the orchestrator once the run terminates.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConversationMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    pub fn opening(&self) -> Option<&ConversationMessage> {
        self.messages.first().filter(|m| m.is_opening())
    }

    /// Messages produced by participants, i.e. everything but the opening and closing.
    pub fn participant_messages(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages
            .iter()
            .filter(|m| !m.is_opening() && !m.is_closing())
    }

    /// Sender ids of all participant messages, in append order.
    pub fn speaker_order(&self) -> Vec<&str> {
        self.participant_messages()
            .map(|m| m.sender_id.as_str())
            .collect()
    }

    /// Sender ids of every message, opening and closing included.
    pub fn sender_order(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.sender_id.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a ConversationMessage;
    type IntoIter = std::slice::Iter<'a, ConversationMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
