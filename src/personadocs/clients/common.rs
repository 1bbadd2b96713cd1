use crate::client_wrapper::{Message, TokenUsage};
use lazy_static::lazy_static;
use openai_rust::chat;
use openai_rust2 as openai_rust;
use std::error::Error;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    /// Process-wide HTTP client so every persona reuses the same connection pool.
    static ref SHARED_HTTP_CLIENT: reqwest::Client = reqwest::ClientBuilder::new()
        .pool_max_idle_per_host(16)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build HTTP client");
}

/// Shared, pooled `reqwest::Client` used by every provider client.
pub fn get_shared_http_client() -> &'static reqwest::Client {
    &SHARED_HTTP_CLIENT
}

/// Store `usage` in a client's usage slot, ignoring a poisoned lock.
pub fn record_usage(usage_slot: &Mutex<Option<TokenUsage>>, usage: TokenUsage) {
    if let Ok(mut slot) = usage_slot.lock() {
        *slot = Some(usage);
    }
}

/// Empty a client's usage slot so a response without usage does not report stale numbers.
pub fn clear_usage(usage_slot: &Mutex<Option<TokenUsage>>) {
    if let Ok(mut slot) = usage_slot.lock() {
        *slot = None;
    }
}

/// Convert crate messages to the OpenAI SDK's message type.
pub fn to_openai_messages(messages: &[Message]) -> Vec<chat::Message> {
    messages
        .iter()
        .map(|msg| chat::Message {
            role: msg.role.as_str().to_owned(),
            content: msg.content.to_string(),
        })
        .collect()
}

/// Send a chat request, record its usage, and return the assistant’s content.
pub async fn send_and_track(
    api: &openai_rust::Client,
    model: &str,
    formatted_msgs: Vec<chat::Message>,
    url_path: Option<String>,
    usage_slot: &Mutex<Option<TokenUsage>>,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    clear_usage(usage_slot);
    let chat_arguments = chat::ChatArguments::new(model, formatted_msgs);

    let response = match api.create_chat(chat_arguments, url_path).await {
        Ok(response) => response,
        Err(err) => {
            log::error!(
                "personadocs::clients::common::send_and_track(...): OpenAI API Error: {}",
                err
            );
            return Err(format!("OpenAI API Error: {}", err).into());
        }
    };

    record_usage(
        usage_slot,
        TokenUsage {
            input_tokens: response.usage.prompt_tokens as usize,
            output_tokens: response.usage.completion_tokens as usize,
            total_tokens: response.usage.total_tokens as usize,
        },
    );

    // Return the assistant’s content
    response
        .choices
        .first()
        .map(|choice| choice.message.content.clone())
        .ok_or_else(|| "OpenAI API returned no choices".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_usage_empties_slot() {
        let slot = Mutex::new(None);
        record_usage(
            &slot,
            TokenUsage {
                input_tokens: 1,
                output_tokens: 2,
                total_tokens: 3,
            },
        );
        assert_eq!(slot.lock().unwrap().as_ref().map(|u| u.total_tokens), Some(3));

        clear_usage(&slot);
        assert!(slot.lock().unwrap().is_none());
    }
}
