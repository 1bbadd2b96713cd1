//! Persona-driven contributors to a conversation.
//!
//! A [`Participant`] pairs a stable id with opaque persona instructions and the
//! generation capability ([`ClientWrapper`]) that writes its reply. It holds no
//! conversation state of its own: every call to [`Participant::reply`] rebuilds the
//! request from the read-only [`Conversation`] it is given.

use crate::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::conversation::{Conversation, ConversationMessage};
use crate::transcript::display_name;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Why a generation request produced no usable reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailureKind {
    /// The client returned an error; the message is the rendered error chain.
    Client(String),
    /// The client answered with empty or whitespace-only content.
    EmptyContent,
}

/// A participant (or the manager) could not produce content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    pub participant_id: String,
    pub kind: GenerationFailureKind,
}

impl GenerationFailure {
    pub fn client(participant_id: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            participant_id: participant_id.into(),
            kind: GenerationFailureKind::Client(error.to_string()),
        }
    }

    pub fn empty(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            kind: GenerationFailureKind::EmptyContent,
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            GenerationFailureKind::Client(msg) => {
                write!(f, "Generation failed for '{}': {}", self.participant_id, msg)
            }
            GenerationFailureKind::EmptyContent => write!(
                f,
                "Generation failed for '{}': empty reply",
                self.participant_id
            ),
        }
    }
}

impl Error for GenerationFailure {}

/// The result of one [`Participant::reply`] call.
#[derive(Debug, Clone)]
pub struct ParticipantReply {
    /// Message ready to be appended at `conversation.next_sequence_index()`.
    pub message: ConversationMessage,
    /// Usage reported by the client for this call, if it tracks any.
    pub tokens_used: Option<TokenUsage>,
}

/// One persona-driven contributor. Immutable after construction.
#[derive(Clone)]
pub struct Participant {
    id: String,
    persona_instructions: Arc<str>,
    client: Arc<dyn ClientWrapper>,
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("id", &self.id)
            .field("model", &self.client.model_name())
            .finish()
    }
}

impl Participant {
    /// Create a participant.
    ///
    /// ```rust,no_run
    /// use personadocs::participant::Participant;
    /// use personadocs::clients::openai::OpenAIClient;
    /// use std::sync::Arc;
    ///
    /// let client = Arc::new(OpenAIClient::new_with_model_string("key", "gpt-4o"));
    /// let writer = Participant::new(
    ///     "ExecutiveSummaryAgent",
    ///     "You focus on the business value.",
    ///     client,
    /// );
    /// assert_eq!(writer.display_name(), "Executive Summary Agent");
    /// ```
    pub fn new(
        id: impl Into<String>,
        persona_instructions: impl AsRef<str>,
        client: Arc<dyn ClientWrapper>,
    ) -> Self {
        Self {
            id: id.into(),
            persona_instructions: Arc::from(persona_instructions.as_ref()),
            client,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human readable form of the id (`ApiUserGuideAgent` -> `Api User Guide Agent`).
    pub fn display_name(&self) -> String {
        display_name(&self.id)
    }

    pub fn persona_instructions(&self) -> &str {
        &self.persona_instructions
    }

    pub fn client(&self) -> &Arc<dyn ClientWrapper> {
        &self.client
    }

    /// Produce this participant's reply to the conversation so far.
    ///
    /// The returned message is attributed to [`Participant::id`], carries
    /// [`Role::Assistant`] and is numbered for the next free position of
    /// `conversation`. Empty content is a [`GenerationFailure`].
    pub async fn reply(
        &self,
        conversation: &Conversation,
    ) -> Result<ParticipantReply, GenerationFailure> {
        let request = build_request(&self.id, &self.persona_instructions, conversation);

        log::debug!(
            "Participant '{}' requesting reply from {} ({} messages)",
            self.id,
            self.client.model_name(),
            request.len()
        );

        let response = match self.client.send_message(&request).await {
            Ok(response) => response,
            Err(e) => {
                if log::log_enabled!(log::Level::Error) {
                    log::error!("Participant '{}' generation error: {}", self.id, e);
                }
                return Err(GenerationFailure::client(&self.id, e));
            }
        };

        if response.content.trim().is_empty() {
            return Err(GenerationFailure::empty(&self.id));
        }

        Ok(ParticipantReply {
            message: ConversationMessage::new(
                self.id.clone(),
                Role::Assistant,
                &*response.content,
                conversation.next_sequence_index(),
            ),
            tokens_used: self.client.get_last_usage(),
        })
    }
}

/// Turn a conversation into a chat request as seen by `speaker_id`.
///
/// The instructions become the system message, the speaker's own turns are replayed as
/// assistant messages and everyone else's turns as user messages labelled with the
/// sender's display name.
pub(crate) fn build_request(
    speaker_id: &str,
    instructions: &str,
    conversation: &Conversation,
) -> Vec<Message> {
    let mut request = Vec::with_capacity(conversation.len() + 1);
    request.push(Message::new(Role::System, instructions));
    for msg in conversation {
        if msg.is_opening() {
            request.push(Message::new(Role::User, &*msg.content));
        } else if msg.sender_id == speaker_id {
            request.push(Message::new(Role::Assistant, &*msg.content));
        } else {
            request.push(Message::new(
                Role::User,
                format!("[{}]: {}", display_name(&msg.sender_id), msg.content),
            ));
        }
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::INITIATOR_ID;

    #[test]
    fn test_build_request_labels_other_speakers() {
        let mut conversation = Conversation::new();
        conversation
            .append(ConversationMessage::new(INITIATOR_ID, Role::User, "def foo()", 0))
            .unwrap();
        conversation
            .append(ConversationMessage::new(
                "DeveloperDocumentationAgent",
                Role::Assistant,
                "technical notes",
                1,
            ))
            .unwrap();

        let request = build_request("ExecutiveSummaryAgent", "be brief", &conversation);

        assert_eq!(request.len(), 3);
        assert_eq!(request[0].role, Role::System);
        assert_eq!(&*request[0].content, "be brief");
        assert_eq!(&*request[1].content, "def foo()");
        assert_eq!(
            &*request[2].content,
            "[Developer Documentation Agent]: technical notes"
        );
        assert_eq!(request[2].role, Role::User);
    }

    #[test]
    fn test_build_request_replays_own_turns_as_assistant() {
        let mut conversation = Conversation::new();
        conversation
            .append(ConversationMessage::new(INITIATOR_ID, Role::User, "doc", 0))
            .unwrap();
        conversation
            .append(ConversationMessage::new("A", Role::Assistant, "mine", 1))
            .unwrap();

        let request = build_request("A", "persona", &conversation);
        assert_eq!(request[2].role, Role::Assistant);
        assert_eq!(&*request[2].content, "mine");
    }
}
