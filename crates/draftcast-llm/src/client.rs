// Claude API client for short, single-turn caption generation.
//
// Each call sends one user message (the full prompt) with a fixed output
// token ceiling, waits for the complete response, and returns the first
// text block with emphasis markup stripped.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use draftcast_core::config::{Credentials, LlmConfig};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const ANTHROPIC_VERSION: &str = "2023-06-01";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status, including authentication failures and rate limits.
    #[error("generation service returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode generation response: {0}")]
    Decode(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// TextGenerator
// ---------------------------------------------------------------------------

/// Anything that turns a prompt into a caption.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// The parts of a Messages API response the client reads.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// The first text block's text, or an empty string when the response holds
/// no text block at all.
pub fn extract_text(response: &MessagesResponse) -> &str {
    response
        .content
        .iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
        .unwrap_or("")
}

/// Remove `**` and `*` emphasis markers and surrounding whitespace.
pub fn sanitize(text: &str) -> String {
    text.replace("**", "").replace('*', "").trim().to_string()
}

// ---------------------------------------------------------------------------
// ClaudeClient
// ---------------------------------------------------------------------------

/// Non-streaming Claude Messages API client.
pub struct ClaudeClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeClient {
    /// Create a new client. `timeout` bounds each request end to end.
    pub fn new(
        api_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url,
            api_key,
            model,
            max_tokens,
        })
    }

    /// Build a client from the `[llm]` section and the resolved credentials.
    pub fn from_config(
        llm: &LlmConfig,
        credentials: &Credentials,
    ) -> Result<Self, GenerationError> {
        Self::new(
            llm.api_url.clone(),
            credentials.anthropic_api_key.clone(),
            llm.model.clone(),
            llm.max_tokens,
            Duration::from_secs(llm.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for ClaudeClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "sending generation request");
        let response = self
            .http
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(%status, "generation service rejected request");
            return Err(GenerationError::Status { status, body: text });
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(GenerationError::Decode)?;
        let raw = extract_text(&parsed);
        if raw.is_empty() {
            warn!("generation response carried no text block");
        }
        Ok(sanitize(raw))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
