//! Speaker selection policies.
//!
//! A [`SpeakerSelector`] proposes who speaks next. The proposal is only a proposal: the
//! orchestrator checks it against the run's
//! [`ParticipationTracker`](crate::tracker::ParticipationTracker) and rejects unknown or
//! repeated ids, so no selector can break the "each participant exactly once" rule.
//!
//! | Selector | Order | Generation calls |
//! |----------|-------|------------------|
//! | [`RoundRobinSelector`] | roster order, deterministic | none |
//! | [`ManagerSelector`] | chosen by a manager LLM | one per round |

use crate::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::conversation::Conversation;
use crate::conversation::ORCHESTRATOR_ID;
use crate::participant::{build_request, GenerationFailure};
use crate::tracker::ParticipationTracker;
use async_trait::async_trait;
use std::sync::Arc;

/// A selector's proposal for one round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Proposed speaker id, `None` when the selector has no candidate.
    pub candidate: Option<String>,
    /// Tokens the selector spent deciding, if it called a model.
    pub tokens_used: Option<TokenUsage>,
}

impl Selection {
    pub fn of(candidate: Option<String>) -> Self {
        Selection {
            candidate,
            tokens_used: None,
        }
    }
}

#[async_trait]
pub trait SpeakerSelector: Send + Sync {
    /// Propose the next speaker.
    async fn select(
        &self,
        tracker: &ParticipationTracker,
        conversation: &Conversation,
    ) -> Result<Selection, GenerationFailure>;

    /// Short name used in events and logs.
    fn name(&self) -> &str;
}

/// Reference policy: the first roster participant that has not acted yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobinSelector;

#[async_trait]
impl SpeakerSelector for RoundRobinSelector {
    async fn select(
        &self,
        tracker: &ParticipationTracker,
        _conversation: &Conversation,
    ) -> Result<Selection, GenerationFailure> {
        Ok(Selection::of(tracker.next_eligible().map(str::to_string)))
    }

    fn name(&self) -> &str {
        "RoundRobin"
    }
}

/// LLM-driven selection: a manager model reads the conversation and names the next
/// speaker among the participants that have not contributed yet.
///
/// The reply is matched case-insensitively against the remaining ids; the first id
/// mentioned wins. When nothing matches, the trimmed reply is returned as-is and the
/// orchestrator rejects it, consuming a round of the budget.
pub struct ManagerSelector {
    client: Arc<dyn ClientWrapper>,
    instructions: String,
}

impl ManagerSelector {
    pub fn new(client: Arc<dyn ClientWrapper>, instructions: impl Into<String>) -> Self {
        Self {
            client,
            instructions: instructions.into(),
        }
    }

    fn pick(reply: &str, remaining: &[&str]) -> Option<String> {
        let lowered = reply.to_lowercase();
        remaining
            .iter()
            .filter_map(|id| lowered.find(&id.to_lowercase()).map(|pos| (pos, *id)))
            // earliest mention wins; among ids starting there, the longest
            .min_by_key(|(pos, id)| (*pos, std::cmp::Reverse(id.len())))
            .map(|(_, id)| id.to_string())
    }
}

#[async_trait]
impl SpeakerSelector for ManagerSelector {
    async fn select(
        &self,
        tracker: &ParticipationTracker,
        conversation: &Conversation,
    ) -> Result<Selection, GenerationFailure> {
        let remaining: Vec<&str> = tracker.remaining().collect();
        if remaining.is_empty() {
            return Ok(Selection::default());
        }

        let mut request = build_request(ORCHESTRATOR_ID, &self.instructions, conversation);
        request.push(Message::new(
            Role::User,
            format!(
                "Participants who have not spoken yet: {}. Reply with exactly one of these names and nothing else.",
                remaining.join(", ")
            ),
        ));

        let reply = self
            .client
            .send_message(&request)
            .await
            .map_err(|e| GenerationFailure::client(ORCHESTRATOR_ID, e))?;

        let reply = reply.content.trim();
        if reply.is_empty() {
            return Err(GenerationFailure::empty(ORCHESTRATOR_ID));
        }
        log::debug!("Manager selection reply: {}", reply);

        Ok(Selection {
            candidate: Some(Self::pick(reply, &remaining).unwrap_or_else(|| reply.to_string())),
            tokens_used: self.client.get_last_usage(),
        })
    }

    fn name(&self) -> &str {
        "Manager"
    }
}
