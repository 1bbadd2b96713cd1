//! The per-turn observer hook.
//!
//! The orchestrator calls [`TurnObserver::notify`] once for every appended message (the
//! opening message, each participant reply and the optional closing message),
//! synchronously and in append order, before the conversation moves on. This is where
//! a UI renders a chat bubble. An `Err` aborts the run with
//! [`OrchestrationError::TurnObserver`](crate::orchestration::OrchestrationError::TurnObserver).
//!
//! Any `Fn(&ConversationMessage) -> Result<(), ObserverError>` is an observer:
//!
//! ```
//! use personadocs::conversation::ConversationMessage;
//! use personadocs::observer::{ObserverError, TurnObserver};
//! use personadocs::Role;
//!
//! let print = |m: &ConversationMessage| -> Result<(), ObserverError> {
//!     println!("{}: {}", m.sender_id, m.content);
//!     Ok(())
//! };
//! print
//!     .notify(&ConversationMessage::new("A", Role::Assistant, "hello", 1))
//!     .unwrap();
//! ```

use crate::conversation::ConversationMessage;
use std::error::Error;
use std::sync::Mutex;

/// Error type observers report.
pub type ObserverError = Box<dyn Error + Send + Sync>;

pub trait TurnObserver: Send + Sync {
    fn notify(&self, message: &ConversationMessage) -> Result<(), ObserverError>;
}

impl<F> TurnObserver for F
where
    F: Fn(&ConversationMessage) -> Result<(), ObserverError> + Send + Sync,
{
    fn notify(&self, message: &ConversationMessage) -> Result<(), ObserverError> {
        self(message)
    }
}

/// Observer that ignores every message.
pub struct NoopObserver;

impl TurnObserver for NoopObserver {
    fn notify(&self, _message: &ConversationMessage) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Observer that keeps a copy of every message it is shown.
///
/// Handy for tests and for callers that want the transcript even when the run fails.
#[derive(Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<ConversationMessage>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages observed so far, in notification order.
    pub fn messages(&self) -> Vec<ConversationMessage> {
        match self.seen.lock() {
            Ok(seen) => seen.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self) -> usize {
        self.messages().len()
    }
}

impl TurnObserver for RecordingObserver {
    fn notify(&self, message: &ConversationMessage) -> Result<(), ObserverError> {
        self.seen
            .lock()
            .map_err(|_| "recording observer lock poisoned")?
            .push(message.clone());
        Ok(())
    }
}
