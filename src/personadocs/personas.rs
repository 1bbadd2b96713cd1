//! The built-in writer personas and the manager that coordinates them.
//!
//! Three personas explain the same docstring for three audiences:
//!
//! | Id | Audience |
//! |----|----------|
//! | `DeveloperDocumentationAgent` | engineers integrating or maintaining the function |
//! | `ExecutiveSummaryAgent` | business stakeholders |
//! | `ApiUserGuideAgent` | callers who need worked examples |

use crate::client_wrapper::ClientWrapper;
use crate::orchestration::{Closing, ConfigurationError, Orchestrator};
use crate::participant::Participant;
use crate::selection::ManagerSelector;
use crate::termination::SentinelSuffix;
use std::sync::Arc;

pub const DEVELOPER_DOCUMENTATION_ID: &str = "DeveloperDocumentationAgent";
pub const EXECUTIVE_SUMMARY_ID: &str = "ExecutiveSummaryAgent";
pub const API_USER_GUIDE_ID: &str = "ApiUserGuideAgent";

pub const DEVELOPER_DOCUMENTATION_INSTRUCTIONS: &str = "You are the Developer Documentation Agent. You will be given a docstring. \
Write technical documentation for it, including the technical scenarios the function can be used in. \
For every parameter, describe the use-cases it serves and the different forms it can take. \
Draw on general knowledge to collect as many technical scenarios and examples as you can, and explain each technical term in the docstring. \
Do not execute code; only write about it.";

pub const EXECUTIVE_SUMMARY_INSTRUCTIONS: &str = "You are the Executive Summary Agent. You focus on business value. \
Briefly explain what the function in the docstring is about and why it matters to the business. \
Use high-level, jargon-free language and avoid technical terms and explanations.";

pub const API_USER_GUIDE_INSTRUCTIONS: &str = "You are the API User Guide Agent. You will be given a docstring. \
Write a practical how-to guide with example scenarios and code for users of the function. \
Start with the main scenarios and use-cases, with examples, then move outwards to the surrounding cases and finally the edge and corner cases. \
Cover every scenario in which the function can be used.";

pub const MANAGER_INSTRUCTIONS: &str = "You are the Group Chat Manager. You coordinate a conversation between the Developer Documentation Agent, \
the Executive Summary Agent and the API User Guide Agent. Every agent must speak exactly once; the order does not matter. \
Make sure each agent delivers clear documentation for its audience. Once all three have replied, end the chat with TERMINATE.";

pub const CLOSING_INSTRUCTIONS: &str = "You are the Group Chat Manager. All three agents have replied. \
Write one short line confirming which perspectives were produced, then end with TERMINATE.";

/// Fixed closing line used when no manager client writes one.
pub const DEFAULT_CLOSING_LINE: &str = "Group chat completed: developer documentation, executive summary and API user guide delivered.";

/// The three writer personas in their reference order, all backed by `client`.
pub fn default_roster(client: Arc<dyn ClientWrapper>) -> Vec<Participant> {
    vec![
        Participant::new(
            DEVELOPER_DOCUMENTATION_ID,
            DEVELOPER_DOCUMENTATION_INSTRUCTIONS,
            client.clone(),
        ),
        Participant::new(
            EXECUTIVE_SUMMARY_ID,
            EXECUTIVE_SUMMARY_INSTRUCTIONS,
            client.clone(),
        ),
        Participant::new(API_USER_GUIDE_ID, API_USER_GUIDE_INSTRUCTIONS, client),
    ]
}

/// How the documentation group chat is wired.
#[derive(Debug, Clone)]
pub struct DocumentationTeamOptions {
    pub max_rounds: usize,
    /// Let the manager model choose the speaking order instead of roster order.
    pub manager_selection: bool,
    /// Have the manager model write the closing line instead of the fixed one.
    pub generated_closing: bool,
}

impl Default for DocumentationTeamOptions {
    fn default() -> Self {
        Self {
            max_rounds: 4,
            manager_selection: false,
            generated_closing: false,
        }
    }
}

/// Build the documentation orchestrator: three personas, a closing line attributed to
/// the orchestrator, and a `TERMINATE` sentinel.
pub fn documentation_team(
    client: Arc<dyn ClientWrapper>,
    options: &DocumentationTeamOptions,
) -> Result<Orchestrator, ConfigurationError> {
    let closing = if options.generated_closing {
        Closing::Generated {
            client: client.clone(),
            instructions: CLOSING_INSTRUCTIONS.to_string(),
        }
    } else {
        Closing::Fixed(DEFAULT_CLOSING_LINE.to_string())
    };

    let mut orchestrator = Orchestrator::new(
        "persona-docs",
        default_roster(client.clone()),
        options.max_rounds,
    )?
    .with_closing(closing)
    .with_termination_condition(Arc::new(SentinelSuffix::terminate()));

    if options.manager_selection {
        orchestrator =
            orchestrator.with_selector(Arc::new(ManagerSelector::new(client, MANAGER_INSTRUCTIONS)));
    }
    Ok(orchestrator)
}
