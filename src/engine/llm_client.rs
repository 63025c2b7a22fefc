use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::engine::error::GameError;
use crate::model::message::Message;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openrouter/sonoma-dusk-alpha";

const TEMPERATURE: f32 = 0.8;
const MAX_TOKENS: u32 = 2000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const REFERER: &str = "https://github.com/dungeon-narrator";
const CLIENT_TITLE: &str = "D&D Game Interface";

/// Sends a transcript to a chat-completion service and returns the reply text.
#[cfg_attr(test, mockall::automock)]
pub trait CompletionClient {
    fn complete(&self, messages: &[Message]) -> Result<String, GameError>;
}

#[derive(Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    pub content: Option<String>,
}

/// OpenRouter (or any OpenAI-compatible) endpoint over blocking HTTPS.
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn configure(&mut self, base_url: &str, api_key: &str, model: &str) {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self.api_key = api_key.to_string();
        self.model = model.to_string();
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn require_key(&self) -> Result<&str, GameError> {
        if self.api_key.trim().is_empty() {
            return Err(GameError::Transport {
                status: None,
                body: "no API key configured".to_string(),
            });
        }
        Ok(&self.api_key)
    }

    pub fn test_connection(&self) -> Result<String, GameError> {
        let key = self.require_key()?;

        let resp = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(key)
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(GameError::Transport { status: Some(status.as_u16()), body });
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| GameError::MalformedResponse(e.to_string()))?;

        Ok(format!(
            "Connected ({} models available)",
            value["data"].as_array().map(|a| a.len()).unwrap_or(0)
        ))
    }
}

impl CompletionClient for OpenRouterClient {
    fn complete(&self, messages: &[Message]) -> Result<String, GameError> {
        let key = self.require_key()?;

        tracing::debug!(
            "Sending {} messages to {} (model: {})",
            messages.len(),
            self.base_url,
            self.model
        );

        let req = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", CLIENT_TITLE)
            .json(&req)
            .send()?;

        let status = resp.status();
        tracing::debug!("Completion answered HTTP {}", status.as_u16());

        let body = resp.text()?;
        if !status.is_success() {
            tracing::error!("Completion API error {}: {}", status.as_u16(), body);
            return Err(GameError::Transport { status: Some(status.as_u16()), body });
        }

        parse_completion_body(&body)
    }
}

/// Pulls `choices[0].message.content` out of a completion payload.
pub fn parse_completion_body(body: &str) -> Result<String, GameError> {
    let resp: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GameError::MalformedResponse(e.to_string()))?;

    resp.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GameError::MalformedResponse("no message content in first choice".into()))
}
