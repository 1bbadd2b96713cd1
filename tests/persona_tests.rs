use async_trait::async_trait;
use personadocs::client_wrapper::{ClientError, ClientWrapper, Message, Role};
use personadocs::observer::RecordingObserver;
use personadocs::orchestration::{ConfigurationError, RunStatus};
use personadocs::personas::{
    default_roster, documentation_team, DocumentationTeamOptions, API_USER_GUIDE_ID,
    DEFAULT_CLOSING_LINE, DEVELOPER_DOCUMENTATION_ID, EXECUTIVE_SUMMARY_ID,
    EXECUTIVE_SUMMARY_INSTRUCTIONS,
};
use personadocs::transcript::{ConsoleObserver, Transcript};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Answers each persona with a line naming the persona its system prompt belongs to.
/// Manager prompts are answered from `manager_script`.
struct PersonaEcho {
    manager_script: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl PersonaEcho {
    fn new(manager_script: &[&str]) -> Self {
        PersonaEcho {
            manager_script: Mutex::new(manager_script.iter().map(|s| s.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ClientWrapper for PersonaEcho {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let system = &messages[0].content;
        let content = if system.starts_with("You are the Group Chat Manager") {
            self.manager_script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or("manager script exhausted")?
        } else if system.starts_with("You are the Developer Documentation Agent") {
            "Technical documentation for foo().".to_string()
        } else if system.starts_with("You are the Executive Summary Agent") {
            "foo() saves the business time.".to_string()
        } else {
            "Usage guide: call foo(1).".to_string()
        };
        Ok(Message::new(Role::Assistant, content))
    }

    fn model_name(&self) -> &str {
        "persona-echo"
    }
}

const DOCSTRING: &str = "def foo(x):\n    \"\"\"Return x doubled.\"\"\"";

#[test]
fn test_default_roster_has_three_distinct_personas() {
    let roster = default_roster(Arc::new(PersonaEcho::new(&[])));
    let ids: Vec<&str> = roster.iter().map(|p| p.id()).collect();
    assert_eq!(
        ids,
        vec![
            DEVELOPER_DOCUMENTATION_ID,
            EXECUTIVE_SUMMARY_ID,
            API_USER_GUIDE_ID
        ]
    );
    assert_eq!(roster[1].persona_instructions(), EXECUTIVE_SUMMARY_INSTRUCTIONS);
    assert_eq!(roster[2].display_name(), "Api User Guide Agent");
}

#[tokio::test]
async fn test_documentation_team_round_robin_with_fixed_closing() {
    let client = Arc::new(PersonaEcho::new(&[]));
    let team = documentation_team(client.clone(), &DocumentationTeamOptions::default()).unwrap();
    let observer = RecordingObserver::new();

    let outcome = team.run(DOCSTRING, &observer).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.conversation.len(), 5);
    assert_eq!(
        outcome.conversation.sender_order(),
        vec![
            "initiator",
            DEVELOPER_DOCUMENTATION_ID,
            EXECUTIVE_SUMMARY_ID,
            API_USER_GUIDE_ID,
            "orchestrator"
        ]
    );
    assert_eq!(
        outcome.conversation.speaker_order(),
        vec![
            DEVELOPER_DOCUMENTATION_ID,
            EXECUTIVE_SUMMARY_ID,
            API_USER_GUIDE_ID
        ]
    );
    assert_eq!(&*outcome.conversation.opening().unwrap().content, DOCSTRING);
    let closing = outcome.conversation.last().unwrap();
    assert!(closing.is_closing());
    assert_eq!(&*closing.content, DEFAULT_CLOSING_LINE);
    assert_eq!(observer.count(), 5);
    assert_eq!(client.requests.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_documentation_team_with_manager_selection() {
    let client = Arc::new(PersonaEcho::new(&[
        "ExecutiveSummaryAgent",
        "ApiUserGuideAgent please",
        "DeveloperDocumentationAgent",
    ]));
    let options = DocumentationTeamOptions {
        manager_selection: true,
        ..DocumentationTeamOptions::default()
    };
    let team = documentation_team(client.clone(), &options).unwrap();

    let outcome = team
        .run(DOCSTRING, &RecordingObserver::new())
        .await
        .unwrap();

    assert_eq!(
        outcome.conversation.sender_order(),
        vec![
            "initiator",
            EXECUTIVE_SUMMARY_ID,
            API_USER_GUIDE_ID,
            DEVELOPER_DOCUMENTATION_ID,
            "orchestrator"
        ]
    );
    assert_eq!(client.requests.lock().unwrap().len(), 6);
}

#[tokio::test]
async fn test_documentation_team_rejects_small_budget() {
    let options = DocumentationTeamOptions {
        max_rounds: 2,
        ..DocumentationTeamOptions::default()
    };
    let err = documentation_team(Arc::new(PersonaEcho::new(&[])), &options).err();
    assert_eq!(
        err,
        Some(ConfigurationError::MaxRoundsTooSmall {
            max_rounds: 2,
            roster_len: 3
        })
    );
}

#[tokio::test]
async fn test_console_and_json_rendering_use_display_names() {
    colored::control::set_override(false);
    let team = documentation_team(
        Arc::new(PersonaEcho::new(&[])),
        &DocumentationTeamOptions::default(),
    )
    .unwrap();
    let console = ConsoleObserver::new(Vec::new());

    let outcome = team.run(DOCSTRING, &console).await.unwrap();

    let rendered = String::from_utf8(console.into_inner()).unwrap();
    assert!(rendered.starts_with("User:\n"));
    assert!(rendered.contains("Developer Documentation Agent:\nTechnical documentation for foo()."));
    assert!(rendered.contains("Executive Summary Agent:"));
    assert!(rendered.contains("Group Chat Manager:"));

    let json: serde_json::Value =
        serde_json::from_str(&Transcript::from_outcome(&outcome).to_json().unwrap()).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["messages"].as_array().unwrap().len(), 5);
    assert_eq!(json["messages"][3]["display_name"], "Api User Guide Agent");
}
