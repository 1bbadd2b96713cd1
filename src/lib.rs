//! # personadocs
//!
//! personadocs explains a single docstring to three audiences at once. Three writer
//! personas (developer documentation, executive summary, API user guide) each contribute
//! exactly once to a shared conversation, coordinated by a turn-taking orchestrator that
//! shows every turn to an observer (a console, a chat UI) as soon as it is produced.
//!
//! The crate is layered as follows:
//!
//! * **Generation**: [`ClientWrapper`] is the only way the crate talks to a language model.
//!   [`clients::azure::AzureOpenAIClient`] and [`clients::openai::OpenAIClient`] implement it;
//!   tests plug in mocks.
//! * **Participants**: [`participant::Participant`] pairs persona instructions with a client
//!   and writes one reply from a read-only [`conversation::Conversation`].
//! * **Orchestration**: [`Orchestrator`] selects speakers through a
//!   [`selection::SpeakerSelector`], records them in a [`tracker::ParticipationTracker`],
//!   notifies a [`observer::TurnObserver`] after every append and stops once everyone has
//!   spoken, a [`termination::TerminationCondition`] fires, or the run is cancelled.
//! * **Personas**: [`personas::documentation_team`] wires the three built-in personas.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use personadocs::clients::azure::AzureOpenAIClient;
//! use personadocs::personas::{documentation_team, DocumentationTeamOptions};
//! use personadocs::transcript::ConsoleObserver;
//! use personadocs::PersonaDocsConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     personadocs::init_logger();
//!
//!     let config = PersonaDocsConfig::from_env()?;
//!     let client = Arc::new(AzureOpenAIClient::from_config(&config));
//!     let team = documentation_team(client, &DocumentationTeamOptions::default())?;
//!
//!     let outcome = team
//!         .run("def add(a, b): \"\"\"Return the sum of a and b.\"\"\"", &ConsoleObserver::stdout())
//!         .await?;
//!     println!("{} messages, status: {}", outcome.conversation.len(), outcome.status.label());
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding personadocs can opt in to `RUST_LOG` driven diagnostics
/// without choosing a logging backend upfront.
///
/// ```rust
/// personadocs::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `personadocs` module.
pub mod personadocs;

// Re-exporting key items for easier external access.
pub use crate::personadocs::client_wrapper;
pub use crate::personadocs::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
pub use crate::personadocs::clients;
pub use crate::personadocs::config;
pub use crate::personadocs::config::PersonaDocsConfig;
pub use crate::personadocs::conversation;
pub use crate::personadocs::conversation::{Conversation, ConversationMessage};
pub use crate::personadocs::event;
pub use crate::personadocs::event::{EventHandler, OrchestrationEvent};
pub use crate::personadocs::observer;
pub use crate::personadocs::observer::TurnObserver;
pub use crate::personadocs::orchestration;
pub use crate::personadocs::orchestration::{
    OrchestrationError, Orchestrator, RunOutcome, RunStatus,
};
pub use crate::personadocs::participant;
pub use crate::personadocs::participant::Participant;
pub use crate::personadocs::personas;
pub use crate::personadocs::selection;
pub use crate::personadocs::termination;
pub use crate::personadocs::tracker;
pub use crate::personadocs::tracker::ParticipationTracker;
pub use crate::personadocs::transcript;
