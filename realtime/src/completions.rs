//! Text completion client for offline summarization.
//!
//! Memory consolidation summarizes history windows with a plain REST call
//! rather than the realtime socket: the call happens off any live session,
//! and a request/response endpoint with a hard timeout fits better than a
//! streaming one.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Summarization calls are slow but bounded; past this the cycle aborts
/// and retries on the next threshold crossing.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

/// REST client for one-shot text completions.
pub struct TextClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl TextClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::InvalidConfig("API key is required".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
            model: DEFAULT_TEXT_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Runs `instructions` over `input` and returns the model's text.
    pub async fn complete(&self, instructions: &str, input: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, "text completion request");

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instructions,
                },
                ChatMessage {
                    role: "user",
                    content: input,
                },
            ],
            temperature: 0.0,
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api(crate::error::ApiError {
                error_type: None,
                code: Some(status.as_u16().to_string()),
                message,
            }));
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                Error::Api(crate::error::ApiError {
                    error_type: None,
                    code: None,
                    message: "completion response had no choices".to_string(),
                })
            })
    }
}
