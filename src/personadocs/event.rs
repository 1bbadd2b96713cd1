//! Orchestration lifecycle events.
//!
//! Implement [`EventHandler`] to receive real-time notifications about a run: start,
//! speaker selection, rejected selections, participant replies and failures, and the
//! final outcome. The handler is purely diagnostic; it cannot fail and it cannot stop a
//! run. Rendering each turn is the job of the
//! [`TurnObserver`](crate::observer::TurnObserver), whose failures do abort the run.
//!
//! # Event Flow (three participants, round-robin)
//!
//! ```text
//! RunStarted { participant_count: 3, max_rounds: 4 }
//!   ├─ SpeakerSelected { round: 1, participant_id: "A" }
//!   ├─ ParticipantResponded { participant_id: "A", response_length: 1234 }
//!   ├─ SpeakerSelected { round: 2, participant_id: "B" }
//!   ├─ ParticipantResponded { participant_id: "B", response_length: 567 }
//!   ├─ SpeakerSelected { round: 3, participant_id: "C" }
//!   └─ ParticipantResponded { participant_id: "C", response_length: 890 }
//! RunFinished { status: "completed", rounds: 3, messages: 4 }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use personadocs::event::{EventHandler, OrchestrationEvent};
//! use async_trait::async_trait;
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl EventHandler for MyHandler {
//!     async fn on_orchestration_event(&self, event: &OrchestrationEvent) {
//!         if let OrchestrationEvent::SpeakerSelected { participant_id, round, .. } = event {
//!             println!("round {}: {} is up", round, participant_id);
//!         }
//!     }
//! }
//! ```

use crate::client_wrapper::TokenUsage;
use async_trait::async_trait;

/// Events emitted by an [`Orchestrator`](crate::orchestration::Orchestrator) during
/// [`run`](crate::orchestration::Orchestrator::run).
///
/// Every variant carries the `run_id` so handlers shared between runs can tell them
/// apart.
#[derive(Debug, Clone)]
pub enum OrchestrationEvent {
    /// Configuration passed validation and the opening message is about to be appended.
    RunStarted {
        run_id: String,
        orchestrator_id: String,
        /// Selector name (e.g. `"RoundRobin"`, `"Manager"`).
        selector: String,
        participant_count: usize,
        max_rounds: usize,
    },

    /// The selector picked an eligible participant for this round.
    SpeakerSelected {
        run_id: String,
        /// 1-based round number.
        round: usize,
        participant_id: String,
    },

    /// The selector returned nothing, an unknown id, or an id that already acted.
    ///
    /// The round is consumed without a turn being taken.
    SelectionRejected {
        run_id: String,
        round: usize,
        /// What the selector returned, if anything.
        candidate: Option<String>,
        reason: String,
    },

    /// A participant's reply was appended and observed.
    ParticipantResponded {
        run_id: String,
        participant_id: String,
        sequence_index: usize,
        tokens_used: Option<TokenUsage>,
        /// Length of the reply in characters (not bytes).
        response_length: usize,
    },

    /// A participant's generation request failed; the run aborts right after.
    ParticipantFailed {
        run_id: String,
        participant_id: String,
        error: String,
    },

    /// The run ended without error (completed, signalled or cancelled).
    RunFinished {
        run_id: String,
        /// `"completed"`, `"signalled"` or `"cancelled"`.
        status: String,
        rounds: usize,
        messages: usize,
        total_tokens: usize,
    },
}

/// Receiver for [`OrchestrationEvent`]s.
///
/// The default implementation is a no-op, so implementors only override what they
/// care about.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_orchestration_event(&self, _event: &OrchestrationEvent) {}
}

/// Forwards every event to the `log` facade at `debug` level.
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn on_orchestration_event(&self, event: &OrchestrationEvent) {
        log::debug!("{:?}", event);
    }
}
