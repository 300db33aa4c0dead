//! CompletionClient - chat-completions client for OpenAI-compatible APIs.
//!
//! Calls the provider's chat completions endpoint directly over HTTP.
//! Configuration comes from environment variables; a missing credential is
//! a configuration error surfaced before any request is made.

use crate::fetcher::SuggestionFetcher;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use wba_core::error::{Result, WbaError};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Environment variable holding the provider API key.
pub const API_KEY_VAR: &str = "WBA_AI_API_KEY";
/// Environment variable overriding the model name.
pub const MODEL_VAR: &str = "WBA_AI_MODEL";
/// Environment variable overriding the completions endpoint.
pub const BASE_URL_VAR: &str = "WBA_AI_BASE_URL";

/// Client for an OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl CompletionClient {
    /// Creates a new client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: None,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// `WBA_AI_API_KEY` is required; `WBA_AI_MODEL` and `WBA_AI_BASE_URL`
    /// fall back to defaults.
    pub fn try_from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_VAR).map_err(|_| {
            WbaError::configuration(format!("{API_KEY_VAR} is not set"))
        })?;
        let model = env::var(MODEL_VAR).unwrap_or_else(|_| DEFAULT_MODEL.into());

        let mut client = Self::new(api_key, model);
        if let Ok(base_url) = env::var(BASE_URL_VAR) {
            client.base_url = base_url;
        }
        Ok(client)
    }

    /// Overrides the endpoint after construction.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| WbaError::external(format!("suggestion request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read provider error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            WbaError::external(format!("failed to parse provider response: {err}"))
        })?;

        extract_text(parsed)
    }
}

#[async_trait]
impl SuggestionFetcher for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
        };

        tracing::debug!(model = %self.model, "requesting suggestion");
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| WbaError::external("provider returned no content in the response"))
}

fn map_http_error(status: StatusCode, body: &str) -> WbaError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => WbaError::configuration(format!(
            "provider rejected the configured credential: {message}"
        )),
        _ => WbaError::external(format!("provider returned {status}: {message}")),
    }
}
