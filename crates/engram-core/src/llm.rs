//! Model-client boundary and the default OpenAI-compatible implementation.

use async_trait::async_trait;
use engram_config::ModelConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One completion request: assembled context plus the user message.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System prompt (persona and assembled memory context).
    pub system: String,
    /// User message for this turn.
    pub user: String,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Errors from the external completion provider.
///
/// The session treats every variant uniformly for memory-atomicity purposes.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network-level failure reaching the provider.
    #[error("transport error: {0}")]
    Transport(String),
    /// Provider answered with a non-success status.
    #[error("provider returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Provider error body, truncated.
        message: String,
    },
    /// The call exceeded its wall-clock bound.
    #[error("model call timed out after {0}s")]
    Timeout(u64),
    /// Response body did not contain a completion.
    #[error("malformed provider response: {0}")]
    Malformed(String),
    /// API key environment variable was not set.
    #[error("missing api key (env={0})")]
    MissingApiKey(String),
}

#[async_trait]
/// External language-model collaborator.
pub trait ModelClient: Send + Sync {
    /// Produce a completion for the request.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError>;
}

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: ModelConfig,
    api_key: String,
}

impl OpenAiClient {
    /// Build a client, reading the API key from the configured environment
    /// variable.
    pub fn from_env(config: ModelConfig) -> Result<Self, ModelError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ModelError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            config,
            api_key,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.name,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
        };
        debug!(
            "sending completion request (model={}, system_len={}, user_len={})",
            self.config.name,
            request.system.len(),
            request.user.len()
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| ModelError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let message = message.chars().take(500).collect();
            return Err(ModelError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| ModelError::Malformed(err.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelError::Malformed("response carried no completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatRequest, ChatResponse, OpenAiClient};
    use engram_config::ModelConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn chat_request_serializes_to_provider_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                super::ChatMessage {
                    role: "system",
                    content: "persona",
                },
                super::ChatMessage {
                    role: "user",
                    content: "hello",
                },
            ],
            temperature: 0.7,
        };
        let raw = serde_json::to_value(&body).expect("serialize");
        assert_eq!(raw["model"], "gpt-4o-mini");
        assert_eq!(raw["messages"][0]["role"], "system");
        assert_eq!(raw["messages"][1]["content"], "hello");
    }

    #[test]
    fn chat_response_extracts_first_choice() {
        let raw = r#"{ "choices": [ { "message": { "content": "hi there" } } ] }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).expect("parse");
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        assert_eq!(content, Some("hi there".to_string()));
    }

    #[test]
    fn from_env_requires_api_key() {
        let config = ModelConfig {
            api_key_env: "ENGRAM_TEST_MISSING_KEY".to_string(),
            ..ModelConfig::default()
        };
        let err = OpenAiClient::from_env(config).expect_err("missing key");
        assert!(err.to_string().contains("ENGRAM_TEST_MISSING_KEY"));
    }
}
