//! Termination detection for an orchestration run.
//!
//! A run stops when every participant acted, or when the configured
//! [`TerminationCondition`] matches the latest message. Exhausting the round budget is
//! not a termination state: it is reported as
//! [`OrchestrationError::TerminationBudgetExceeded`](crate::orchestration::OrchestrationError::TerminationBudgetExceeded).

use crate::conversation::ConversationMessage;
use crate::tracker::ParticipationTracker;
use serde::Serialize;

/// Predicate deciding whether a message carries an explicit termination signal.
///
/// Closures work too:
///
/// ```
/// use personadocs::termination::TerminationCondition;
/// use personadocs::conversation::ConversationMessage;
/// use personadocs::Role;
///
/// let stop_on_done = |m: &ConversationMessage| m.content.contains("DONE");
/// let msg = ConversationMessage::new("A", Role::Assistant, "all DONE", 1);
/// assert!(stop_on_done.is_termination(&msg));
/// ```
pub trait TerminationCondition: Send + Sync {
    fn is_termination(&self, message: &ConversationMessage) -> bool;
}

impl<F> TerminationCondition for F
where
    F: Fn(&ConversationMessage) -> bool + Send + Sync,
{
    fn is_termination(&self, message: &ConversationMessage) -> bool {
        self(message)
    }
}

/// Matches messages whose trimmed content ends with a sentinel token.
#[derive(Debug, Clone)]
pub struct SentinelSuffix {
    token: String,
}

impl SentinelSuffix {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The `TERMINATE` sentinel the manager persona is told to emit.
    pub fn terminate() -> Self {
        Self::new("TERMINATE")
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl TerminationCondition for SentinelSuffix {
    fn is_termination(&self, message: &ConversationMessage) -> bool {
        message.content.trim_end().ends_with(self.token.as_str())
    }
}

/// Why a run stopped producing turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TerminationReason {
    /// Every roster participant contributed exactly once.
    AllParticipantsActed,
    /// The termination condition matched a message from `sender_id`.
    SignalDetected { sender_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationState {
    Running,
    Terminated(TerminationReason),
}

impl TerminationState {
    /// Evaluate termination after `latest` was appended and its sender marked acted.
    ///
    /// Completion by roster takes precedence over the sentinel.
    pub fn evaluate(
        tracker: &ParticipationTracker,
        latest: &ConversationMessage,
        condition: Option<&dyn TerminationCondition>,
    ) -> Self {
        if tracker.is_complete() {
            return TerminationState::Terminated(TerminationReason::AllParticipantsActed);
        }
        match condition {
            Some(c) if c.is_termination(latest) => {
                TerminationState::Terminated(TerminationReason::SignalDetected {
                    sender_id: latest.sender_id.clone(),
                })
            }
            _ => TerminationState::Running,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, TerminationState::Terminated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_wrapper::Role;

    fn msg(content: &str) -> ConversationMessage {
        ConversationMessage::new("A", Role::Assistant, content, 1)
    }

    #[test]
    fn test_sentinel_suffix_ignores_trailing_whitespace() {
        let sentinel = SentinelSuffix::terminate();
        assert!(sentinel.is_termination(&msg("all three reported. TERMINATE\n")));
        assert!(!sentinel.is_termination(&msg("TERMINATE is what I will say later")));
    }

    #[test]
    fn test_completion_wins_over_running() {
        let mut tracker = ParticipationTracker::new(vec!["A".into()]);
        tracker.mark_acted("A").unwrap();
        let state = TerminationState::evaluate(&tracker, &msg("hi"), None);
        assert_eq!(
            state,
            TerminationState::Terminated(TerminationReason::AllParticipantsActed)
        );
    }

    #[test]
    fn test_signal_detected_before_completion() {
        let mut tracker = ParticipationTracker::new(vec!["A".into(), "B".into()]);
        tracker.mark_acted("A").unwrap();
        let sentinel = SentinelSuffix::terminate();
        let state = TerminationState::evaluate(&tracker, &msg("done TERMINATE"), Some(&sentinel));
        assert_eq!(
            state,
            TerminationState::Terminated(TerminationReason::SignalDetected {
                sender_id: "A".into()
            })
        );

        let state = TerminationState::evaluate(&tracker, &msg("more to say"), Some(&sentinel));
        assert!(!state.is_terminated());
    }
}
