//! LLM Client: the single point of entry for all model calls in the service.
//!
//! ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
//! Pipelines depend on the `ChatModel` trait; `LlmClient` is the production backend.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
#[cfg(test)]
pub mod testing;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Backoff stops doubling after this many retries (1s << 5 = 32s).
const MAX_BACKOFF_EXPONENT: u32 = 5;
/// Model used when `LLM_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM credentials are not configured")]
    MissingCredentials,

    #[error("Conversation has no user or assistant turns")]
    EmptyConversation,
}

/// Speaker of a single conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged turn of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The chat-completion capability every pipeline depends on.
///
/// Carried in `AppState` as `Arc<dyn ChatModel>` so tests can swap in a scripted double.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends the ordered transcript and returns the model's reply text.
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// Explicit gateway settings, built from `Config` at startup.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Total attempts per call, including the first.
    pub max_retries: u32,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize, PartialEq)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Production gateway: wraps the Anthropic Messages API with bounded retries.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Makes a raw call to the API, returning the full response object.
    /// Retries on transport errors, 429 and 5xx with exponential backoff.
    pub async fn call(&self, messages: &[ChatMessage]) -> Result<LlmResponse, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingCredentials)?;

        let (system, turns) = to_anthropic_turns(messages);
        if turns.is_empty() {
            return Err(LlmError::EmptyConversation);
        }

        let request_body = AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: turns,
        };

        let max_attempts = self.config.max_retries.max(1);
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: max_attempts,
        }))
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let response = self.call(messages).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Splits a transcript into the API's `system` field and alternating turns.
/// System turns are joined in order; adjacent same-role turns are merged.
fn to_anthropic_turns(messages: &[ChatMessage]) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut turns: Vec<AnthropicMessage> = Vec::new();

    for message in messages {
        if message.role == Role::System {
            system_parts.push(message.content.trim());
            continue;
        }
        match turns.last_mut() {
            Some(last) if last.role == message.role.as_str() => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            _ => turns.push(AnthropicMessage {
                role: message.role.as_str(),
                content: message.content.clone(),
            }),
        }
    }

    let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
    (system, turns)
}

/// Exponential backoff before retry `attempt` (1-based): 1s, 2s, 4s, capped at 32s.
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    Duration::from_millis(1000 << exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(str::to_string),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 256,
            timeout_secs: 5,
            max_retries: 2,
        }
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(6), Duration::from_secs(32));
        assert_eq!(backoff_delay(40), Duration::from_secs(32));
    }

    #[test]
    fn test_system_turns_are_lifted_into_system_field() {
        let messages = vec![
            ChatMessage::system("You build resumes."),
            ChatMessage::user("Analyze this job."),
            ChatMessage::assistant("It needs Rust."),
            ChatMessage::system("Current resume: {}"),
            ChatMessage::user("Add a summary."),
        ];
        let (system, turns) = to_anthropic_turns(&messages);

        assert_eq!(
            system.as_deref(),
            Some("You build resumes.\n\nCurrent resume: {}")
        );
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, "user");
        assert_eq!(turns[1].role, "assistant");
        assert_eq!(turns[2].content, "Add a summary.");
    }

    #[test]
    fn test_adjacent_same_role_turns_are_merged() {
        let messages = vec![ChatMessage::user("first"), ChatMessage::user("second")];
        let (system, turns) = to_anthropic_turns(&messages);

        assert!(system.is_none());
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "first\n\nsecond");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_without_network() {
        let client = LlmClient::new(config(None)).unwrap();
        let err = client
            .invoke(&[ChatMessage::user("hello")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingCredentials));
    }

    #[tokio::test]
    async fn test_system_only_conversation_is_rejected() {
        let client = LlmClient::new(config(Some("test-key"))).unwrap();
        let err = client
            .invoke(&[ChatMessage::system("only a system turn")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyConversation));
    }
}
