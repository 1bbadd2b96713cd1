//! `AzureOpenAIClient` implements `ClientWrapper` for Azure OpenAI chat completion
//! deployments.
//!
//! Azure differs from the public OpenAI API in three ways: the deployment name is part of
//! the URL, the REST version travels as the `api-version` query parameter, and the key is
//! sent in an `api-key` header.
//!
//! ```rust,no_run
//! use personadocs::clients::azure::AzureOpenAIClient;
//! use personadocs::PersonaDocsConfig;
//!
//! let config = PersonaDocsConfig::from_env().unwrap();
//! let client = AzureOpenAIClient::from_config(&config);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

use crate::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
use crate::clients::common::{clear_usage, get_shared_http_client, record_usage};
use crate::config::PersonaDocsConfig;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

/// Client wrapper for one Azure OpenAI deployment.
pub struct AzureOpenAIClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    temperature: f32,
    seed: Option<u64>,
    request_timeout: Duration,
    token_usage: Mutex<Option<TokenUsage>>,
}

impl AzureOpenAIClient {
    pub fn new(endpoint: &str, api_key: &str, deployment: &str, api_version: &str) -> Self {
        let defaults = PersonaDocsConfig::default();
        AzureOpenAIClient {
            http: get_shared_http_client().clone(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            deployment: deployment.to_string(),
            api_version: api_version.to_string(),
            temperature: defaults.temperature,
            seed: defaults.seed,
            request_timeout: defaults.request_timeout,
            token_usage: Mutex::new(None),
        }
    }

    pub fn from_config(config: &PersonaDocsConfig) -> Self {
        Self::new(
            &config.endpoint,
            &config.api_key,
            &config.model,
            &config.api_version,
        )
        .with_temperature(config.temperature)
        .with_seed(config.seed)
        .with_request_timeout(config.request_timeout)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Full chat completions URL for this deployment.
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl ClientWrapper for AzureOpenAIClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        clear_usage(&self.token_usage);
        let request = ChatRequest {
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.temperature,
            seed: self.seed,
        };

        let response = self
            .http
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if log::log_enabled!(log::Level::Error) {
                log::error!(
                    "AzureOpenAIClient::send_message(...): {} returned {}: {}",
                    self.deployment,
                    status,
                    body
                );
            }
            return Err(format!("Azure OpenAI API Error {}: {}", status, body).into());
        }

        let parsed: ChatResponse = response.json().await?;
        if let Some(usage) = parsed.usage {
            record_usage(
                &self.token_usage,
                TokenUsage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                    total_tokens: usage.total_tokens,
                },
            );
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(Message::new(Role::Assistant, content))
    }

    fn model_name(&self) -> &str {
        &self.deployment
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
