use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::domain::value_objects::assistant::ChatMessage;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_COMPLETION_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

/// Chat completions client. One request per call, no retries.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build openai http client")?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url
                .unwrap_or_else(|| OPENAI_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;
        let completion = resp.json::<ChatCompletionResponse>().await?;

        let content = extract_content(completion)?;
        debug!(model = %self.model, chars = content.len(), "openai: completion received");
        Ok(content)
    }

    async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            "openai chat completion failed"
        );

        anyhow::bail!("OpenAI request failed with status {}", status);
    }
}

fn extract_content(completion: ChatCompletionResponse) -> Result<String> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .context("completion contained no message content")
}
