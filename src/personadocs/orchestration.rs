//! Turn-taking orchestration engine.
//!
//! An [`Orchestrator`] owns a roster of [`Participant`]s and drives one conversation per
//! [`run`](Orchestrator::run) call: it appends the opening message, then repeatedly
//! selects the next eligible participant, requests its reply, appends it, shows it to
//! the [`TurnObserver`], records the participant as having acted and evaluates
//! termination. Every participant speaks exactly once.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!   ├─ SpeakerSelector (RoundRobin by default, or Manager)
//!   ├─ TerminationCondition (optional sentinel, e.g. "TERMINATE")
//!   ├─ Closing (optional final message attributed to the orchestrator)
//!   ├─ EventHandler (optional lifecycle events)
//!   └─ Participants (roster order)
//!
//! run(opening, observer)
//!   ├─ Conversation        (fresh per run, append-only)
//!   └─ ParticipationTracker (fresh per run)
//! ```
//!
//! # Rounds
//!
//! Each selection attempt is a round. `max_rounds` must be at least the roster size,
//! which the round-robin selector always satisfies. A selector that proposes missing,
//! unknown or repeated ids burns rounds; when the budget runs out before everyone
//! spoke, the run fails with [`OrchestrationError::TerminationBudgetExceeded`].
//!
//! # Example
//!
//! ```rust,no_run
//! use personadocs::orchestration::Orchestrator;
//! use personadocs::observer::NoopObserver;
//! use personadocs::participant::Participant;
//! use personadocs::clients::openai::OpenAIClient;
//! use std::sync::Arc;
//!
//! # async {
//! let client = Arc::new(OpenAIClient::new_with_model_string("key", "gpt-4o"));
//! let roster = vec![
//!     Participant::new("DeveloperDocumentationAgent", "Write technical docs.", client.clone()),
//!     Participant::new("ExecutiveSummaryAgent", "Focus on business value.", client),
//! ];
//!
//! let orchestrator = Orchestrator::new("docs", roster, 3).unwrap();
//! let outcome = orchestrator.run("def foo(x): ...", &NoopObserver).await.unwrap();
//! assert!(outcome.is_complete());
//! # };
//! ```

use crate::client_wrapper::{ClientWrapper, Role, TokenUsage};
use crate::conversation::{
    Conversation, ConversationError, ConversationMessage, INITIATOR_ID, ORCHESTRATOR_ID,
};
use crate::event::{EventHandler, OrchestrationEvent};
use crate::observer::{ObserverError, TurnObserver};
use crate::participant::{build_request, GenerationFailure, Participant};
use crate::selection::{RoundRobinSelector, SpeakerSelector};
use crate::termination::{TerminationCondition, TerminationReason, TerminationState};
use crate::tracker::ParticipationTracker;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Problems detected before a run starts. No generation call and no observer call
/// happen when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The roster has no participants.
    EmptyRoster,
    /// Two participants share an id.
    DuplicateParticipant(String),
    /// A participant uses [`INITIATOR_ID`] or [`ORCHESTRATOR_ID`].
    ReservedParticipantId(String),
    /// `max_rounds` cannot fit one turn per participant.
    MaxRoundsTooSmall { max_rounds: usize, roster_len: usize },
    /// The opening message is empty or whitespace.
    EmptyOpeningMessage,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::EmptyRoster => write!(f, "No participants in roster"),
            ConfigurationError::DuplicateParticipant(id) => {
                write!(f, "Participant with id '{}' already exists", id)
            }
            ConfigurationError::ReservedParticipantId(id) => {
                write!(f, "Participant id '{}' is reserved", id)
            }
            ConfigurationError::MaxRoundsTooSmall {
                max_rounds,
                roster_len,
            } => write!(
                f,
                "max_rounds ({}) is smaller than the roster ({} participants)",
                max_rounds, roster_len
            ),
            ConfigurationError::EmptyOpeningMessage => write!(f, "Opening message is empty"),
        }
    }
}

impl Error for ConfigurationError {}

/// Errors returned from [`Orchestrator::run`].
///
/// Every variant raised after the loop started carries the partial conversation, see
/// [`OrchestrationError::partial_conversation`].
#[derive(Debug)]
pub enum OrchestrationError {
    Configuration(ConfigurationError),
    /// A participant (or the manager) could not produce a reply.
    Generation {
        failure: GenerationFailure,
        conversation: Conversation,
    },
    /// The observer failed while being shown the message at `sequence_index`.
    TurnObserver {
        sequence_index: usize,
        error: ObserverError,
        conversation: Conversation,
    },
    /// The round budget ran out before every participant acted.
    TerminationBudgetExceeded {
        max_rounds: usize,
        acted: usize,
        roster_len: usize,
        conversation: Conversation,
    },
    /// An append broke the conversation's ordering invariants.
    Conversation(ConversationError),
}

impl OrchestrationError {
    /// Conversation as it stood when the run aborted, if the loop had started.
    pub fn partial_conversation(&self) -> Option<&Conversation> {
        match self {
            OrchestrationError::Generation { conversation, .. }
            | OrchestrationError::TurnObserver { conversation, .. }
            | OrchestrationError::TerminationBudgetExceeded { conversation, .. } => {
                Some(conversation)
            }
            OrchestrationError::Configuration(_) | OrchestrationError::Conversation(_) => None,
        }
    }

    /// Take ownership of the partial conversation.
    pub fn into_partial_conversation(self) -> Option<Conversation> {
        match self {
            OrchestrationError::Generation { conversation, .. }
            | OrchestrationError::TurnObserver { conversation, .. }
            | OrchestrationError::TerminationBudgetExceeded { conversation, .. } => {
                Some(conversation)
            }
            OrchestrationError::Configuration(_) | OrchestrationError::Conversation(_) => None,
        }
    }
}

impl fmt::Display for OrchestrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationError::Configuration(e) => write!(f, "Invalid configuration: {}", e),
            OrchestrationError::Generation { failure, .. } => write!(f, "{}", failure),
            OrchestrationError::TurnObserver {
                sequence_index,
                error,
                ..
            } => write!(
                f,
                "Turn observer failed on message {}: {}",
                sequence_index, error
            ),
            OrchestrationError::TerminationBudgetExceeded {
                max_rounds,
                acted,
                roster_len,
                ..
            } => write!(
                f,
                "Round budget of {} exhausted with {}/{} participants done",
                max_rounds, acted, roster_len
            ),
            OrchestrationError::Conversation(e) => write!(f, "Conversation error: {}", e),
        }
    }
}

impl Error for OrchestrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OrchestrationError::Configuration(e) => Some(e),
            OrchestrationError::Generation { failure, .. } => Some(failure),
            OrchestrationError::Conversation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigurationError> for OrchestrationError {
    fn from(e: ConfigurationError) -> Self {
        OrchestrationError::Configuration(e)
    }
}

impl From<ConversationError> for OrchestrationError {
    fn from(e: ConversationError) -> Self {
        OrchestrationError::Conversation(e)
    }
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every participant contributed exactly once.
    Completed,
    /// The termination condition matched a message from `sender_id` before everyone spoke.
    TerminatedBySignal { sender_id: String },
    /// The cancellation token fired between rounds.
    Cancelled,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::TerminatedBySignal { .. } => "signalled",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

/// The result of a run that did not fail.
#[derive(Debug)]
pub struct RunOutcome {
    /// Unique id of this run, also carried by every emitted event.
    pub run_id: String,
    /// The sealed conversation (partial when cancelled).
    pub conversation: Conversation,
    pub status: RunStatus,
    /// Rounds consumed, including rejected selections.
    pub rounds: usize,
    /// Tokens reported by clients that track usage, covering participant replies,
    /// manager selections and a generated closing; zero when no client reports usage.
    pub total_tokens_used: usize,
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }
}

/// The final message appended once a run terminates.
pub enum Closing {
    /// No closing message.
    None,
    /// A fixed line attributed to the orchestrator.
    Fixed(String),
    /// A summary written by a manager client from its instructions and the transcript.
    Generated {
        client: Arc<dyn ClientWrapper>,
        instructions: String,
    },
}

/// Coordinates a fixed roster of participants through one conversation per run.
pub struct Orchestrator {
    /// Stable identifier used in logs and events.
    pub id: String,
    participants: Vec<Participant>,
    max_rounds: usize,
    selector: Arc<dyn SpeakerSelector>,
    termination: Option<Arc<dyn TerminationCondition>>,
    closing: Closing,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Orchestrator {
    /// Validate the roster and round budget.
    ///
    /// Fails with [`ConfigurationError`] on an empty roster, duplicate or reserved ids,
    /// or `max_rounds` smaller than the roster.
    pub fn new(
        id: impl Into<String>,
        participants: Vec<Participant>,
        max_rounds: usize,
    ) -> Result<Self, ConfigurationError> {
        if participants.is_empty() {
            return Err(ConfigurationError::EmptyRoster);
        }
        let mut seen = HashSet::new();
        for p in &participants {
            if p.id() == INITIATOR_ID || p.id() == ORCHESTRATOR_ID {
                return Err(ConfigurationError::ReservedParticipantId(p.id().to_string()));
            }
            if !seen.insert(p.id()) {
                return Err(ConfigurationError::DuplicateParticipant(p.id().to_string()));
            }
        }
        if max_rounds < participants.len() {
            return Err(ConfigurationError::MaxRoundsTooSmall {
                max_rounds,
                roster_len: participants.len(),
            });
        }

        Ok(Self {
            id: id.into(),
            participants,
            max_rounds,
            selector: Arc::new(RoundRobinSelector),
            termination: None,
            closing: Closing::None,
            event_handler: None,
        })
    }

    /// Replace the round-robin selector (builder pattern).
    pub fn with_selector(mut self, selector: Arc<dyn SpeakerSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Stop early when `condition` matches a participant's message (builder pattern).
    pub fn with_termination_condition(mut self, condition: Arc<dyn TerminationCondition>) -> Self {
        self.termination = Some(condition);
        self
    }

    /// Append a closing message once the run terminates (builder pattern).
    pub fn with_closing(mut self, closing: Closing) -> Self {
        self.closing = closing;
        self
    }

    /// Attach an [`EventHandler`] for lifecycle events (builder pattern).
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn get_participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id() == id)
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    async fn emit(&self, event: OrchestrationEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_orchestration_event(&event).await;
        }
    }

    /// Run one conversation to termination.
    pub async fn run(
        &self,
        opening_message: &str,
        observer: &dyn TurnObserver,
    ) -> Result<RunOutcome, OrchestrationError> {
        self.run_with_cancellation(opening_message, observer, &CancellationToken::new())
            .await
    }

    /// Like [`Orchestrator::run`], checking `cancel` between rounds.
    ///
    /// A cancelled run returns `Ok` with [`RunStatus::Cancelled`] and the conversation up
    /// to the last appended message. An in-flight reply is never interrupted.
    pub async fn run_with_cancellation(
        &self,
        opening_message: &str,
        observer: &dyn TurnObserver,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, OrchestrationError> {
        if opening_message.trim().is_empty() {
            return Err(ConfigurationError::EmptyOpeningMessage.into());
        }

        let run_id = Uuid::new_v4().to_string();
        let mut conversation = Conversation::new();
        let mut tracker = ParticipationTracker::new(
            self.participants.iter().map(|p| p.id().to_string()).collect(),
        );
        let mut total_tokens = 0;
        let mut round = 0;

        log::info!(
            "Orchestrator '{}' run {} started with {} participants (selector: {}, max_rounds: {})",
            self.id,
            run_id,
            self.participants.len(),
            self.selector.name(),
            self.max_rounds
        );
        self.emit(OrchestrationEvent::RunStarted {
            run_id: run_id.clone(),
            orchestrator_id: self.id.clone(),
            selector: self.selector.name().to_string(),
            participant_count: self.participants.len(),
            max_rounds: self.max_rounds,
        })
        .await;

        let opening = ConversationMessage::new(INITIATOR_ID, Role::User, opening_message, 0);
        append_and_notify(&mut conversation, opening, observer)?;

        let reason = loop {
            if cancel.is_cancelled() {
                return Ok(self
                    .finish(run_id, conversation, RunStatus::Cancelled, round, total_tokens)
                    .await);
            }
            if round == self.max_rounds {
                log::warn!(
                    "Run {} exhausted {} rounds with {}/{} participants done",
                    run_id,
                    self.max_rounds,
                    tracker.acted_count(),
                    tracker.roster_len()
                );
                conversation.seal();
                return Err(OrchestrationError::TerminationBudgetExceeded {
                    max_rounds: self.max_rounds,
                    acted: tracker.acted_count(),
                    roster_len: tracker.roster_len(),
                    conversation,
                });
            }
            round += 1;

            let selection = match self.selector.select(&tracker, &conversation).await {
                Ok(selection) => selection,
                Err(failure) => {
                    return Err(self.generation_failed(&run_id, failure, conversation).await)
                }
            };
            if let Some(usage) = &selection.tokens_used {
                total_tokens += usage.total_tokens;
            }
            let candidate = selection.candidate;

            let participant = match candidate.as_deref() {
                Some(id) if tracker.is_eligible(id) => self.get_participant(id),
                _ => None,
            };
            let participant = match participant {
                Some(p) => p,
                None => {
                    let reason = match candidate.as_deref() {
                        None => "selector returned no candidate".to_string(),
                        Some(id) if tracker.has_acted(id) => format!("'{}' already acted", id),
                        Some(id) => format!("'{}' is not on the roster", id),
                    };
                    log::warn!("Run {} round {}: selection rejected, {}", run_id, round, reason);
                    self.emit(OrchestrationEvent::SelectionRejected {
                        run_id: run_id.clone(),
                        round,
                        candidate,
                        reason,
                    })
                    .await;
                    continue;
                }
            };

            self.emit(OrchestrationEvent::SpeakerSelected {
                run_id: run_id.clone(),
                round,
                participant_id: participant.id().to_string(),
            })
            .await;

            let reply = match participant.reply(&conversation).await {
                Ok(reply) => reply,
                Err(failure) => {
                    return Err(self.generation_failed(&run_id, failure, conversation).await)
                }
            };
            if let Some(usage) = &reply.tokens_used {
                total_tokens += usage.total_tokens;
            }

            let sequence_index = reply.message.sequence_index;
            let response_length = reply.message.content.chars().count();
            let latest = append_and_notify(&mut conversation, reply.message, observer)?;
            log::debug!(
                "Run {} round {}: '{}' replied ({} chars)",
                run_id,
                round,
                participant.id(),
                response_length
            );

            // is_eligible was checked above, so marking cannot fail
            if let Err(e) = tracker.mark_acted(participant.id()) {
                log::error!("Run {}: {}", run_id, e);
            }

            let state = TerminationState::evaluate(&tracker, &latest, self.termination.as_deref());

            self.emit(OrchestrationEvent::ParticipantResponded {
                run_id: run_id.clone(),
                participant_id: participant.id().to_string(),
                sequence_index,
                tokens_used: reply.tokens_used,
                response_length,
            })
            .await;

            if let TerminationState::Terminated(reason) = state {
                break reason;
            }
        };

        if cancel.is_cancelled() {
            return Ok(self
                .finish(run_id, conversation, RunStatus::Cancelled, round, total_tokens)
                .await);
        }

        if let Some(text) = self.closing_text(&run_id, &conversation).await {
            let (text, usage) = match text {
                Ok(closing) => closing,
                Err(failure) => {
                    return Err(self.generation_failed(&run_id, failure, conversation).await)
                }
            };
            if let Some(usage) = usage {
                total_tokens += usage.total_tokens;
            }
            let closing = ConversationMessage::new(
                ORCHESTRATOR_ID,
                Role::Assistant,
                text,
                conversation.next_sequence_index(),
            );
            append_and_notify(&mut conversation, closing, observer)?;
        }

        let status = match reason {
            TerminationReason::AllParticipantsActed => RunStatus::Completed,
            TerminationReason::SignalDetected { sender_id } => {
                RunStatus::TerminatedBySignal { sender_id }
            }
        };
        Ok(self
            .finish(run_id, conversation, status, round, total_tokens)
            .await)
    }

    async fn closing_text(
        &self,
        run_id: &str,
        conversation: &Conversation,
    ) -> Option<Result<(String, Option<TokenUsage>), GenerationFailure>> {
        match &self.closing {
            Closing::None => None,
            Closing::Fixed(text) => Some(Ok((text.clone(), None))),
            Closing::Generated {
                client,
                instructions,
            } => {
                log::debug!("Run {}: requesting closing summary", run_id);
                let request = build_request(ORCHESTRATOR_ID, instructions, conversation);
                let result = match client.send_message(&request).await {
                    Ok(reply) if reply.content.trim().is_empty() => {
                        Err(GenerationFailure::empty(ORCHESTRATOR_ID))
                    }
                    Ok(reply) => Ok((reply.content.to_string(), client.get_last_usage())),
                    Err(e) => Err(GenerationFailure::client(ORCHESTRATOR_ID, e)),
                };
                Some(result)
            }
        }
    }

    async fn generation_failed(
        &self,
        run_id: &str,
        failure: GenerationFailure,
        mut conversation: Conversation,
    ) -> OrchestrationError {
        if log::log_enabled!(log::Level::Error) {
            log::error!("Run {} aborted: {}", run_id, failure);
        }
        self.emit(OrchestrationEvent::ParticipantFailed {
            run_id: run_id.to_string(),
            participant_id: failure.participant_id.clone(),
            error: failure.to_string(),
        })
        .await;
        conversation.seal();
        OrchestrationError::Generation {
            failure,
            conversation,
        }
    }

    async fn finish(
        &self,
        run_id: String,
        mut conversation: Conversation,
        status: RunStatus,
        rounds: usize,
        total_tokens_used: usize,
    ) -> RunOutcome {
        conversation.seal();
        log::info!(
            "Orchestrator '{}' run {} {} after {} rounds ({} messages)",
            self.id,
            run_id,
            status.label(),
            rounds,
            conversation.len()
        );
        self.emit(OrchestrationEvent::RunFinished {
            run_id: run_id.clone(),
            status: status.label().to_string(),
            rounds,
            messages: conversation.len(),
            total_tokens: total_tokens_used,
        })
        .await;
        RunOutcome {
            run_id,
            conversation,
            status,
            rounds,
            total_tokens_used,
        }
    }
}

/// Append `message`, then show it to the observer. Returns a copy of the appended message.
fn append_and_notify(
    conversation: &mut Conversation,
    message: ConversationMessage,
    observer: &dyn TurnObserver,
) -> Result<ConversationMessage, OrchestrationError> {
    let appended = conversation.append(message)?.clone();
    if let Err(error) = observer.notify(&appended) {
        if log::log_enabled!(log::Level::Error) {
            log::error!(
                "Turn observer failed on message {}: {}",
                appended.sequence_index,
                error
            );
        }
        conversation.seal();
        return Err(OrchestrationError::TurnObserver {
            sequence_index: appended.sequence_index,
            error,
            conversation: std::mem::take(conversation),
        });
    }
    Ok(appended)
}

/// One-shot convenience: validate, build a round-robin [`Orchestrator`] and run it.
pub async fn run(
    opening_message: &str,
    participants: Vec<Participant>,
    observer: &dyn TurnObserver,
    max_rounds: usize,
) -> Result<RunOutcome, OrchestrationError> {
    Orchestrator::new("orchestrator", participants, max_rounds)?
        .run(opening_message, observer)
        .await
}
